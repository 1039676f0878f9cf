//! sketchreel batch-renders a directory of animation sketches into video files.
//!
//! Each sketch is handed to an external single-item renderer running as its own process. A
//! [`Scheduler`] keeps at most a fixed number of those processes alive at once, refills a slot as
//! soon as one frees up, and collects every [`Outcome`] into a [`BatchReport`].
//!
//! # Pipeline overview
//!
//! 1. **Discover**: [`TaskSource`] lists eligible files of a directory, ordered by name
//! 2. **Schedule**: [`Scheduler::run`] admits items into free slots in that order
//! 3. **Invoke**: an [`Invoker`] (normally [`RendererCommand`]) turns one item into one outcome
//! 4. **Report**: a [`ProgressReporter`] sees every dispatch and completion, then the final report
//!
//! One failing sketch never stops its siblings: invocation failures are data in the report, not
//! errors returned from [`run_batch`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod batch;
mod foundation;

/// Batch configuration and defaults.
pub mod config;
/// External renderer invocation.
pub mod invoke;
/// Bounded-concurrency scheduling and reporting.
pub mod schedule;
/// Input discovery.
pub mod source;

pub use crate::batch::{ensure_dir, plan, run_batch, run_batch_with};
pub use crate::config::{BatchConfig, ValidatedConfig};
pub use crate::foundation::core::{Ceiling, RenderConfig, VideoFormat, WorkItem};
pub use crate::foundation::error::{BatchError, BatchResult};
pub use crate::invoke::renderer::{Invoker, Outcome, RendererCommand};
pub use crate::schedule::report::{
    BatchReport, ConsoleReporter, Progress, ProgressReporter, RecordingReporter, ReportEvent,
    SilentReporter,
};
pub use crate::schedule::scheduler::{Scheduler, run};
pub use crate::source::tasks::{DEFAULT_SUFFIX, TaskSource};

//! Invocation of the external per-item renderer.
//!
//! Invokers turn one [`WorkItem`](crate::WorkItem) into one [`Outcome`](crate::Outcome) and never
//! return errors past that boundary.

/// Subprocess invoker and the [`renderer::Invoker`] seam.
pub mod renderer;

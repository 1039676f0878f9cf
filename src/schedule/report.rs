use crate::foundation::core::WorkItem;
use crate::invoke::renderer::Outcome;
use std::io::Write;
use std::time::Duration;

/// Snapshot of a run taken right after a dispatch or completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Items with a recorded outcome.
    pub completed: usize,
    /// Invocations currently running.
    pub active: usize,
    /// Items not yet started.
    pub waiting: usize,
    /// Items in the batch.
    pub total: usize,
}

/// Final result of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Items in the batch.
    pub total: usize,
    /// Items with a recorded outcome; equals `total` for a finished run.
    pub completed: usize,
    /// Failed outcomes in completion order.
    pub failures: Vec<Outcome>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl BatchReport {
    /// Return `true` when no item failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of items that rendered successfully.
    pub fn succeeded(&self) -> usize {
        self.completed.saturating_sub(self.failures.len())
    }

    /// Items whose invocation failed.
    pub fn failed_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.failures.iter().map(|o| &o.item)
    }
}

/// Collects every outcome of a run in completion order.
#[derive(Debug)]
pub(crate) struct Aggregator {
    outcomes: Vec<Outcome>,
    total: usize,
}

impl Aggregator {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(total),
            total,
        }
    }

    /// Store `outcome` and return its slot.
    pub(crate) fn record(&mut self, outcome: Outcome) -> usize {
        debug_assert!(self.outcomes.len() < self.total, "more outcomes than items");
        self.outcomes.push(outcome);
        self.outcomes.len() - 1
    }

    pub(crate) fn get(&self, slot: usize) -> &Outcome {
        &self.outcomes[slot]
    }

    pub(crate) fn completed(&self) -> usize {
        self.outcomes.len()
    }

    pub(crate) fn into_report(self, elapsed: Duration) -> BatchReport {
        let completed = self.outcomes.len();
        let failures = self
            .outcomes
            .into_iter()
            .filter(|o| !o.is_success())
            .collect();
        BatchReport {
            total: self.total,
            completed,
            failures,
            elapsed,
        }
    }
}

/// Observer of scheduler events.
///
/// Called only from the scheduling thread, once per event, in event order.
pub trait ProgressReporter {
    /// A run over `total` items is starting.
    fn on_start(&mut self, _total: usize) {}
    /// `item` was admitted into a free slot.
    fn on_dispatch(&mut self, _item: &WorkItem, _progress: Progress) {}
    /// An invocation finished and its slot was released.
    fn on_complete(&mut self, _outcome: &Outcome, _progress: Progress) {}
    /// The run drained.
    fn on_finish(&mut self, _report: &BatchReport) {}
}

/// Reporter that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Human-readable progress lines.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<std::io::Stderr> {
    /// Reporter writing to stderr.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Reporter writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    // Console output is best-effort; a closed terminal must not fail the batch.
    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.out.write_fmt(args);
        let _ = self.out.write_all(b"\n");
    }
}

impl<W: Write> ProgressReporter for ConsoleReporter<W> {
    fn on_start(&mut self, total: usize) {
        self.line(format_args!("Found {total} sketches to process"));
    }

    fn on_dispatch(&mut self, item: &WorkItem, _progress: Progress) {
        self.line(format_args!("Starting render for {}", item.name()));
    }

    fn on_complete(&mut self, outcome: &Outcome, p: Progress) {
        match &outcome.error {
            None => self.line(format_args!(
                "Completed render for {} ({:.2}s)",
                outcome.item.name(),
                outcome.elapsed.as_secs_f64()
            )),
            Some(err) => self.line(format_args!(
                "Error rendering {}: {err}",
                outcome.item.name()
            )),
        }
        self.line(format_args!(
            "Progress: {}/{} sketches processed ({} waiting, {} active)",
            p.completed, p.total, p.waiting, p.active
        ));
    }

    fn on_finish(&mut self, report: &BatchReport) {
        self.line(format_args!("\nAll sketches processed!"));
        if report.is_success() {
            self.line(format_args!("All sketches rendered successfully!"));
            return;
        }
        self.line(format_args!(
            "\n{} sketches failed to render:",
            report.failures.len()
        ));
        for item in report.failed_items() {
            self.line(format_args!("- {}", item.name()));
        }
    }
}

/// One event captured by [`RecordingReporter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportEvent {
    /// Run started.
    Start {
        /// Items in the batch.
        total: usize,
    },
    /// Item admitted.
    Dispatch {
        /// Item file name.
        name: String,
        /// Progress right after admission.
        progress: Progress,
    },
    /// Item finished.
    Complete {
        /// Item file name.
        name: String,
        /// Whether the invocation succeeded.
        success: bool,
        /// Progress right after the slot was released.
        progress: Progress,
    },
    /// Run drained.
    Finish {
        /// Items with an outcome.
        completed: usize,
        /// Failed items.
        failed: usize,
    },
}

/// In-memory reporter for tests and debugging.
#[derive(Clone, Debug, Default)]
pub struct RecordingReporter {
    events: Vec<ReportEvent>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the captured events.
    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    /// Largest `active` count seen in any event.
    pub fn peak_active(&self) -> usize {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Dispatch { progress, .. } | ReportEvent::Complete { progress, .. } => {
                    Some(progress.active)
                }
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_start(&mut self, total: usize) {
        self.events.push(ReportEvent::Start { total });
    }

    fn on_dispatch(&mut self, item: &WorkItem, progress: Progress) {
        self.events.push(ReportEvent::Dispatch {
            name: item.name(),
            progress,
        });
    }

    fn on_complete(&mut self, outcome: &Outcome, progress: Progress) {
        self.events.push(ReportEvent::Complete {
            name: outcome.item.name(),
            success: outcome.is_success(),
            progress,
        });
    }

    fn on_finish(&mut self, report: &BatchReport) {
        self.events.push(ReportEvent::Finish {
            completed: report.completed,
            failed: report.failures.len(),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/report.rs"]
mod tests;

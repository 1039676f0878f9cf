use crate::foundation::core::Ceiling;
use crate::invoke::renderer::Outcome;
use crate::schedule::report::{Aggregator, BatchReport, Progress};
use std::time::Duration;

/// Mutable bookkeeping of one batch run.
///
/// Owned by the scheduling thread; workers never touch it. Invariants after every method:
/// `active <= ceiling` and `active + completed + (total - cursor) == total`.
#[derive(Debug)]
pub(crate) struct SchedulerState {
    total: usize,
    ceiling: usize,
    cursor: usize,
    active: usize,
    results: Aggregator,
}

impl SchedulerState {
    pub(crate) fn new(total: usize, ceiling: Ceiling) -> Self {
        Self {
            total,
            ceiling: ceiling.get(),
            cursor: 0,
            active: 0,
            results: Aggregator::new(total),
        }
    }

    /// Claim a free slot for the next unstarted item, returning its index.
    pub(crate) fn admit(&mut self) -> Option<usize> {
        if self.active >= self.ceiling || self.cursor >= self.total {
            return None;
        }
        let idx = self.cursor;
        self.cursor += 1;
        self.active += 1;
        self.check();
        Some(idx)
    }

    /// Release the slot held by `outcome`'s invocation and record it.
    pub(crate) fn complete(&mut self, outcome: Outcome) -> (&Outcome, Progress) {
        debug_assert!(self.active > 0, "completion without an active invocation");
        self.active = self.active.saturating_sub(1);
        let slot = self.results.record(outcome);
        self.check();
        let progress = self.progress();
        (self.results.get(slot), progress)
    }

    pub(crate) fn progress(&self) -> Progress {
        let completed = self.results.completed();
        Progress {
            completed,
            active: self.active,
            waiting: self
                .total
                .saturating_sub(completed)
                .saturating_sub(self.active),
            total: self.total,
        }
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.results.completed() == self.total
    }

    pub(crate) fn active(&self) -> usize {
        self.active
    }

    pub(crate) fn into_report(self, elapsed: Duration) -> BatchReport {
        debug_assert!(self.is_drained());
        self.results.into_report(elapsed)
    }

    fn check(&self) {
        debug_assert!(self.active <= self.ceiling);
        debug_assert!(self.cursor <= self.total);
        debug_assert_eq!(
            self.active + self.results.completed() + (self.total - self.cursor),
            self.total
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/state.rs"]
mod tests;

use crate::foundation::core::{Ceiling, WorkItem};
use crate::foundation::error::{BatchError, BatchResult};
use crate::invoke::renderer::{Invoker, Outcome};
use crate::schedule::report::{BatchReport, ProgressReporter};
use crate::schedule::state::SchedulerState;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::time::Instant;

/// Slot-pool scheduler running at most `ceiling` invocations at once.
///
/// Items are admitted in enumeration order. Each finished invocation frees its slot, which is
/// refilled with the next unstarted item before the scheduler waits again. The scheduling loop
/// blocks on a completion channel and returns at the completion that drains the batch.
pub struct Scheduler<'a> {
    ceiling: Ceiling,
    invoker: &'a dyn Invoker,
}

impl<'a> Scheduler<'a> {
    /// Scheduler dispatching to `invoker`.
    pub fn new(ceiling: Ceiling, invoker: &'a dyn Invoker) -> Self {
        Self { ceiling, invoker }
    }

    /// Process every item and return once all of them have an outcome.
    ///
    /// Per-item failures are recorded in the report. Errors are returned only when the worker
    /// pool cannot be created, before any dispatch.
    pub fn run(
        &self,
        items: &[WorkItem],
        reporter: &mut dyn ProgressReporter,
    ) -> BatchResult<BatchReport> {
        let started = Instant::now();
        let mut state = SchedulerState::new(items.len(), self.ceiling);
        let effective = self.ceiling.effective(items.len());

        tracing::info!(
            total = items.len(),
            ceiling = self.ceiling.get(),
            effective,
            "batch starting"
        );
        reporter.on_start(items.len());

        if !items.is_empty() {
            let pool = build_render_pool(effective)?;
            let invoker = self.invoker;
            let (tx, rx) = mpsc::channel::<Outcome>();

            pool.in_place_scope(|scope| -> BatchResult<()> {
                admit(&mut state, items, invoker, scope, &tx, reporter);
                while !state.is_drained() {
                    let outcome = rx.recv().map_err(|_| {
                        BatchError::Other(anyhow::anyhow!("completion channel disconnected"))
                    })?;
                    let (outcome, progress) = state.complete(outcome);
                    match &outcome.error {
                        None => tracing::debug!(
                            item = %outcome.item.name(),
                            completed = progress.completed,
                            active = progress.active,
                            "render finished"
                        ),
                        Some(err) => tracing::warn!(
                            item = %outcome.item.name(),
                            error = %err,
                            "render failed"
                        ),
                    }
                    reporter.on_complete(outcome, progress);
                    admit(&mut state, items, invoker, scope, &tx, reporter);
                }
                Ok(())
            })?;
        }

        let report = state.into_report(started.elapsed());
        tracing::info!(
            completed = report.completed,
            failed = report.failures.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch finished"
        );
        reporter.on_finish(&report);
        Ok(report)
    }
}

/// Validate `ceiling` and run `items` through `invoker`.
///
/// A ceiling `<= 0` is rejected before anything is dispatched.
pub fn run(
    items: &[WorkItem],
    ceiling: i64,
    invoker: &dyn Invoker,
    reporter: &mut dyn ProgressReporter,
) -> BatchResult<BatchReport> {
    let ceiling = Ceiling::new(ceiling)?;
    Scheduler::new(ceiling, invoker).run(items, reporter)
}

fn admit<'scope>(
    state: &mut SchedulerState,
    items: &'scope [WorkItem],
    invoker: &'scope dyn Invoker,
    scope: &rayon::Scope<'scope>,
    done: &mpsc::Sender<Outcome>,
    reporter: &mut dyn ProgressReporter,
) {
    while let Some(idx) = state.admit() {
        let item = &items[idx];
        tracing::debug!(item = %item.name(), active = state.active(), "dispatching");
        reporter.on_dispatch(item, state.progress());

        let done = done.clone();
        scope.spawn(move |_| {
            let outcome = invoke_isolated(invoker, item);
            // The receiver lives until the batch drains, which needs this very outcome.
            let _ = done.send(outcome);
        });
    }
}

/// Run one invocation, turning a panic into a failed outcome so the slot is always released.
fn invoke_isolated(invoker: &dyn Invoker, item: &WorkItem) -> Outcome {
    let started = Instant::now();
    catch_unwind(AssertUnwindSafe(|| invoker.invoke(item))).unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Outcome::failure(
            item.clone(),
            BatchError::invocation(format!("renderer invoker panicked: {msg}")),
            started.elapsed(),
        )
    })
}

fn build_render_pool(threads: usize) -> BatchResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(BatchError::configuration(
            "render pool needs at least one thread",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("sketchreel-render-{i}"))
        .build()
        .map_err(|e| BatchError::Other(anyhow::anyhow!("failed to build render pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;

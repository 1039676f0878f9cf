use crate::config::ValidatedConfig;
use crate::foundation::core::WorkItem;
use crate::foundation::error::{BatchError, BatchResult};
use crate::invoke::renderer::Invoker;
use crate::schedule::report::{BatchReport, ProgressReporter};
use crate::schedule::scheduler::Scheduler;
use std::path::Path;
use std::sync::Arc;

/// Enumerate the work items a batch would render, without launching anything.
pub fn plan(cfg: &ValidatedConfig) -> BatchResult<Vec<WorkItem>> {
    cfg.source.work_items(Arc::new(cfg.render.clone()))
}

/// Render every eligible sketch with the configured renderer.
pub fn run_batch(
    cfg: &ValidatedConfig,
    reporter: &mut dyn ProgressReporter,
) -> BatchResult<BatchReport> {
    run_batch_with(cfg, &cfg.renderer, reporter)
}

/// Like [`run_batch`], dispatching to a caller-supplied invoker.
///
/// Directory and output-directory errors are returned before any dispatch; per-item failures
/// only show up in the report.
pub fn run_batch_with(
    cfg: &ValidatedConfig,
    invoker: &dyn Invoker,
    reporter: &mut dyn ProgressReporter,
) -> BatchResult<BatchReport> {
    let items = plan(cfg)?;
    if !items.is_empty() {
        ensure_dir(&cfg.render.output_dir)?;
    }
    Scheduler::new(cfg.ceiling, invoker).run(&items, reporter)
}

/// Create `dir` and its parents if needed.
pub fn ensure_dir(dir: &Path) -> BatchResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| BatchError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

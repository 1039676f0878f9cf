use crate::foundation::core::{RenderConfig, WorkItem};
use crate::foundation::error::{BatchError, BatchResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default suffix of renderable sketch files.
pub const DEFAULT_SUFFIX: &str = ".js";

/// Enumerates eligible inputs of one directory.
#[derive(Clone, Debug)]
pub struct TaskSource {
    dir: PathBuf,
    suffix: String,
}

impl TaskSource {
    /// Source over `dir` matching files whose name ends with `suffix`.
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    /// Directory being enumerated.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Eligible input paths, ordered by file name.
    ///
    /// Only regular files (symlinks are followed) qualify. An empty directory yields an empty
    /// list, not an error.
    pub fn discover(&self) -> BatchResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| BatchError::directory_unreadable(&self.dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BatchError::directory_unreadable(&self.dir, e))?;
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(self.suffix.as_str()) {
                continue;
            }
            let path = entry.path();
            // `metadata` follows symlinks; dangling links are skipped rather than failing the batch.
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => names.push(name),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                }
            }
        }

        names.sort();
        Ok(names.into_iter().map(|n| self.dir.join(n)).collect())
    }

    /// Eligible inputs bound to the shared render settings.
    pub fn work_items(&self, render: Arc<RenderConfig>) -> BatchResult<Vec<WorkItem>> {
        let items: Vec<WorkItem> = self
            .discover()?
            .into_iter()
            .map(|p| WorkItem::new(p, render.clone()))
            .collect();
        tracing::info!(
            dir = %self.dir.display(),
            suffix = %self.suffix,
            count = items.len(),
            "discovered work items"
        );
        Ok(items)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/tasks.rs"]
mod tests;

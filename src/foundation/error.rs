use std::path::PathBuf;

/// Convenience result type used across sketchreel.
pub type BatchResult<T> = Result<T, BatchError>;

/// Top-level error taxonomy for batch runs.
///
/// Only [`BatchError::DirectoryUnreadable`], [`BatchError::Configuration`] and
/// [`BatchError::OutputDirectory`] are fatal to a run. [`BatchError::Invocation`] is carried as
/// data inside a failed [`Outcome`](crate::Outcome) and never aborts sibling items.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    /// The sketches directory could not be listed.
    #[error("directory unreadable: '{}': {source}", .path.display())]
    DirectoryUnreadable {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid ceiling, format or render settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The output directory could not be created.
    #[error("output directory error: '{}': {source}", .path.display())]
    OutputDirectory {
        /// Directory that failed to be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// One renderer invocation failed (spawn error, non-zero exit, or panic).
    #[error("invocation failure: {0}")]
    Invocation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BatchError {
    /// Build a [`BatchError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`BatchError::Invocation`] value.
    pub fn invocation(msg: impl Into<String>) -> Self {
        Self::Invocation(msg.into())
    }

    /// Build a [`BatchError::DirectoryUnreadable`] value.
    pub fn directory_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryUnreadable {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

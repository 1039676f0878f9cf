use crate::foundation::error::{BatchError, BatchResult};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Output container produced by the external renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// H.264 in an MP4 container.
    Mp4,
    /// VP9 in a WebM container.
    #[default]
    Webm,
}

impl VideoFormat {
    /// File extension (without the dot) and renderer `-f` argument.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for VideoFormat {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            other => Err(BatchError::configuration(format!(
                "unknown video format '{other}' (expected 'mp4' or 'webm')"
            ))),
        }
    }
}

/// Rendering settings shared by every item of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Output container.
    pub format: VideoFormat,
    /// Target frame rate, must be non-zero.
    pub fps: u32,
    /// Number of frames to capture, must be non-zero.
    pub total_frames: u32,
    /// Directory the renderer writes videos into.
    pub output_dir: PathBuf,
    /// Output resolution multiplier, must be finite and positive.
    pub device_scale_factor: f64,
}

impl RenderConfig {
    /// Reject settings the renderer cannot honor.
    pub fn validate(&self) -> BatchResult<()> {
        if self.fps == 0 {
            return Err(BatchError::configuration("fps must be non-zero"));
        }
        if self.total_frames == 0 {
            return Err(BatchError::configuration("total frames must be non-zero"));
        }
        if !self.device_scale_factor.is_finite() || self.device_scale_factor <= 0.0 {
            return Err(BatchError::configuration(format!(
                "device scale factor must be a positive number, got {}",
                self.device_scale_factor
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(BatchError::configuration("output directory must not be empty"));
        }
        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: VideoFormat::default(),
            fps: 30,
            total_frames: 60,
            output_dir: PathBuf::from("."),
            device_scale_factor: 2.0,
        }
    }
}

/// One input sketch plus the batch's shared render settings.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkItem {
    input: PathBuf,
    render: Arc<RenderConfig>,
}

impl WorkItem {
    /// Create a work item for `input`.
    pub fn new(input: impl Into<PathBuf>, render: Arc<RenderConfig>) -> Self {
        Self {
            input: input.into(),
            render,
        }
    }

    /// Path of the renderable input.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Shared render settings.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// File name used in human-readable lines.
    pub fn name(&self) -> String {
        self.input
            .file_name()
            .unwrap_or(self.input.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Video the renderer is expected to write: `<output_dir>/<stem>.<ext>`.
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .unwrap_or(self.input.as_os_str())
            .to_string_lossy();
        self.render
            .output_dir
            .join(format!("{stem}.{}", self.render.format.extension()))
    }
}

/// Maximum number of renderer processes running at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ceiling(NonZeroUsize);

impl Ceiling {
    /// Validate a user-provided ceiling. Zero and negative values are rejected.
    pub fn new(value: i64) -> BatchResult<Self> {
        if value < 1 {
            return Err(BatchError::configuration(format!(
                "max concurrent renders must be >= 1, got {value}"
            )));
        }
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or_else(|| {
                BatchError::configuration(format!(
                    "max concurrent renders out of range for this platform, got {value}"
                ))
            })
    }

    /// Ceiling as a plain count.
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Concurrency actually reachable for `n` items.
    pub fn effective(self, n: usize) -> usize {
        self.get().min(n)
    }
}

impl Default for Ceiling {
    fn default() -> Self {
        Self(NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

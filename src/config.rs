//! Batch-level configuration.
//!
//! A [`BatchConfig`] can be loaded from a JSON file and overridden field by field from the
//! command line. Nothing is checked until [`BatchConfig::validate`], which runs before any
//! directory listing or dispatch.

use crate::foundation::core::{Ceiling, RenderConfig, VideoFormat};
use crate::foundation::error::{BatchError, BatchResult};
use crate::invoke::renderer::RendererCommand;
use crate::source::tasks::{DEFAULT_SUFFIX, TaskSource};
use std::path::{Path, PathBuf};

/// Every knob of a batch run, with the batch tool's defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Directory containing the sketch files.
    pub sketches_dir: PathBuf,
    /// Suffix a file name must end with to be rendered.
    pub suffix: String,
    /// Output format, `mp4` or `webm`.
    pub format: String,
    /// Frames per second.
    pub fps: u32,
    /// Number of frames to render per sketch.
    pub total_frames: u32,
    /// Where videos are written; created if absent.
    pub output_dir: PathBuf,
    /// Resolution multiplier passed to the renderer.
    pub device_scale_factor: f64,
    /// Maximum renderer processes at once.
    pub max_concurrent: i64,
    /// Renderer program.
    pub renderer: String,
    /// Arguments placed before the per-item renderer flags.
    pub renderer_args: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let render = RenderConfig::default();
        Self {
            sketches_dir: PathBuf::new(),
            suffix: DEFAULT_SUFFIX.to_string(),
            format: render.format.to_string(),
            fps: render.fps,
            total_frames: render.total_frames,
            output_dir: render.output_dir,
            device_scale_factor: render.device_scale_factor,
            max_concurrent: Ceiling::default().get() as i64,
            renderer: "node".to_string(),
            renderer_args: vec!["render.js".to_string()],
        }
    }
}

/// Checked form of a [`BatchConfig`].
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    /// Where inputs come from.
    pub source: TaskSource,
    /// Settings shared by every item.
    pub render: RenderConfig,
    /// Concurrency ceiling.
    pub ceiling: Ceiling,
    /// Renderer invoked per item.
    pub renderer: RendererCommand,
}

impl BatchConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> BatchResult<Self> {
        use anyhow::Context as _;
        let f = std::fs::File::open(path)
            .with_context(|| format!("open config '{}'", path.display()))?;
        let cfg = serde_json::from_reader(std::io::BufReader::new(f))
            .map_err(|e| BatchError::configuration(format!("{}: {e}", path.display())))?;
        Ok(cfg)
    }

    /// Reject anything that would make the run fail before its first dispatch.
    pub fn validate(&self) -> BatchResult<ValidatedConfig> {
        if self.sketches_dir.as_os_str().is_empty() {
            return Err(BatchError::configuration("sketches directory is required"));
        }
        if self.suffix.is_empty() {
            return Err(BatchError::configuration("file suffix must not be empty"));
        }
        if self.renderer.trim().is_empty() {
            return Err(BatchError::configuration("renderer program must not be empty"));
        }

        let ceiling = Ceiling::new(self.max_concurrent)?;
        let format: VideoFormat = self.format.parse()?;
        let render = RenderConfig {
            format,
            fps: self.fps,
            total_frames: self.total_frames,
            output_dir: self.output_dir.clone(),
            device_scale_factor: self.device_scale_factor,
        };
        render.validate()?;

        Ok(ValidatedConfig {
            source: TaskSource::new(&self.sketches_dir, &self.suffix),
            render,
            ceiling,
            renderer: RendererCommand::new(&self.renderer).with_args(&self.renderer_args),
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

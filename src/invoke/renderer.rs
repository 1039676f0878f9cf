use crate::foundation::core::WorkItem;
use crate::foundation::error::BatchError;
use std::ffi::OsString;
use std::io::Read;
use std::process::{ChildStderr, Command, Stdio};
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

/// Bytes of renderer stderr kept for a failure message; earlier output is dropped.
pub const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// How long a failed invocation waits for stderr to close after the renderer exited.
const STDERR_GRACE: Duration = Duration::from_millis(200);

const TRUNCATED_MARKER: &str = "(truncated) \u{2026}";

/// Recorded result of processing one work item.
#[derive(Debug)]
pub struct Outcome {
    /// Item this outcome belongs to.
    pub item: WorkItem,
    /// `None` on success, otherwise the captured failure.
    pub error: Option<BatchError>,
    /// Wall time spent in the invocation.
    pub elapsed: Duration,
}

impl Outcome {
    /// Successful outcome.
    pub fn success(item: WorkItem, elapsed: Duration) -> Self {
        Self {
            item,
            error: None,
            elapsed,
        }
    }

    /// Failed outcome carrying `error`.
    pub fn failure(item: WorkItem, error: BatchError, elapsed: Duration) -> Self {
        Self {
            item,
            error: Some(error),
            elapsed,
        }
    }

    /// Return `true` when the item rendered successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs one work item to completion.
///
/// Implementations block until the item is done and must report every failure as a failed
/// [`Outcome`]. They do not manage concurrency; the scheduler calls them from pool threads,
/// hence `Sync`. The slot is held until `invoke` returns, so an implementation should return
/// once its own work is done rather than waiting on processes it left behind.
pub trait Invoker: Sync {
    /// Process `item` and return its outcome.
    fn invoke(&self, item: &WorkItem) -> Outcome;
}

impl<F> Invoker for F
where
    F: Fn(&WorkItem) -> Outcome + Sync,
{
    fn invoke(&self, item: &WorkItem) -> Outcome {
        self(item)
    }
}

/// External renderer launched once per item as a subprocess.
///
/// The command line is `<program> <args>... -s <input> -f <format> -r <fps> -t <frames>
/// -o <output_dir> -d <device_scale_factor>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl RendererCommand {
    /// Renderer run as `program` with no leading arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append leading arguments placed before the per-item flags.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program being launched.
    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Full command for `item`, not yet spawned.
    pub fn command_for(&self, item: &WorkItem) -> Command {
        let render = item.render();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("-s")
            .arg(item.input())
            .args(["-f", render.format.extension()])
            .args(["-r", &render.fps.to_string()])
            .args(["-t", &render.total_frames.to_string()])
            .arg("-o")
            .arg(&render.output_dir)
            .args(["-d", &render.device_scale_factor.to_string()]);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for RendererCommand {
    fn default() -> Self {
        Self::new("node").with_args(["render.js"])
    }
}

impl Invoker for RendererCommand {
    #[tracing::instrument(level = "debug", skip_all, fields(item = %item.name()))]
    fn invoke(&self, item: &WorkItem) -> Outcome {
        let started = Instant::now();
        let mut child = match self.command_for(item).spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = BatchError::invocation(format!(
                    "failed to spawn renderer '{}': {e}",
                    self.program.to_string_lossy()
                ));
                return Outcome::failure(item.clone(), err, started.elapsed());
            }
        };

        // Drained on its own thread: a grandchild holding the pipe must not pin the slot.
        let stderr = child.stderr.take().and_then(StderrCollector::spawn);
        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                let err = BatchError::invocation(format!("failed to wait for renderer: {e}"));
                return Outcome::failure(item.clone(), err, started.elapsed());
            }
        };

        if !status.success() {
            let detail = stderr
                .map(|s| s.finish(STDERR_GRACE))
                .unwrap_or_default();
            let err = BatchError::invocation(format!(
                "renderer exited with status {status}: {}",
                detail.trim()
            ));
            return Outcome::failure(item.clone(), err, started.elapsed());
        }

        tracing::debug!(output = %item.output_path().display(), "renderer finished");
        Outcome::success(item.clone(), started.elapsed())
    }
}

/// Last `cap` bytes of a byte stream.
#[derive(Debug)]
struct StderrTail {
    buf: Vec<u8>,
    cap: usize,
    truncated: bool,
}

impl StderrTail {
    fn new(cap: usize) -> Self {
        Self {
            buf: Vec::new(),
            cap,
            truncated: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        if self.buf.len() > self.cap {
            let excess = self.buf.len() - self.cap;
            self.buf.drain(..excess);
            self.truncated = true;
        }
    }

    /// Lossy text of the kept bytes, starting on a char boundary.
    fn render(&self) -> String {
        let mut kept = self.buf.as_slice();
        if self.truncated {
            // Skip UTF-8 continuation bytes left over from the cut.
            let skip = kept
                .iter()
                .take(3)
                .take_while(|b| (**b & 0xC0) == 0x80)
                .count();
            kept = &kept[skip..];
        }
        let text = String::from_utf8_lossy(kept);
        if self.truncated {
            format!("{TRUNCATED_MARKER}{text}")
        } else {
            text.into_owned()
        }
    }
}

/// Background reader keeping the tail of a renderer's stderr.
struct StderrCollector {
    tail: Arc<Mutex<StderrTail>>,
    closed: mpsc::Receiver<()>,
}

impl StderrCollector {
    fn spawn(mut pipe: ChildStderr) -> Option<Self> {
        let tail = Arc::new(Mutex::new(StderrTail::new(STDERR_TAIL_BYTES)));
        let (tx, closed) = mpsc::channel();
        let shared = Arc::clone(&tail);
        let spawned = std::thread::Builder::new()
            .name("sketchreel-stderr".to_string())
            .spawn(move || {
                let mut chunk = [0u8; 4096];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => shared
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push(&chunk[..n]),
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(_) => break,
                    }
                }
                let _ = tx.send(());
            });
        match spawned {
            Ok(_) => Some(Self { tail, closed }),
            Err(e) => {
                tracing::warn!(error = %e, "failed to start stderr reader");
                None
            }
        }
    }

    /// Wait up to `grace` for the pipe to close, then return what was captured so far.
    fn finish(self, grace: Duration) -> String {
        let _ = self.closed.recv_timeout(grace);
        self.tail
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .render()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/invoke/renderer.rs"]
mod tests;

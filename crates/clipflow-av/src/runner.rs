//! Subprocess execution with merged diagnostics and timeout support.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default command timeout: 5 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from one subprocess run.
///
/// ffmpeg writes its diagnostics to stderr, so stdout and stderr lines are
/// merged into a single ordered list. Immutable once produced.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Captured output lines, stdout first, then stderr.
    pub lines: Vec<String>,
    /// Process exit status. 1 when the process could not be started or timed
    /// out, never silently 0.
    pub status: i32,
}

impl ProcessResult {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// The captured lines joined for pattern scanning.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Executes the external media binary.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegRunner {
    /// Create a runner for the given binary path or name.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the maximum execution time per invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured binary.
    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }

    /// Run the binary with the given arguments, capturing all output.
    ///
    /// This never returns an error: a spawn failure or an expired timeout
    /// yields a [`ProcessResult`] with status 1 and the reason as a line, so
    /// the caller's verification step reports it as a subprocess failure.
    /// No retries.
    pub async fn run(&self, args: &[String]) -> ProcessResult {
        tracing::debug!(binary = %self.binary.display(), ?args, "spawning");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Reap the child when the wait future is dropped on timeout.
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ProcessResult {
                    lines: vec![format!(
                        "failed to spawn {}: {e}",
                        self.binary.display()
                    )],
                    status: 1,
                }
            }
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .map(str::to_string)
                    .collect();
                lines.extend(
                    String::from_utf8_lossy(&output.stderr)
                        .lines()
                        .map(str::to_string),
                );
                ProcessResult {
                    lines,
                    status: output.status.code().unwrap_or(1),
                }
            }
            Ok(Err(e)) => ProcessResult {
                lines: vec![format!("I/O error waiting for process: {e}")],
                status: 1,
            },
            Err(_elapsed) => {
                // kill_on_drop terminated the child with the cancelled wait.
                ProcessResult {
                    lines: vec![format!("timed out after {:?}", self.timeout)],
                    status: 1,
                }
            }
        }
    }
}

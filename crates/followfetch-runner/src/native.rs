use crate::error::RunnerError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::time::timeout;

use super::{CommandSpec, ProcessOutput, ProcessRunner, RingBuffer};

/// Default capture cap for worker stdout (4 MiB)
pub const DEFAULT_STDOUT_CAP_BYTES: usize = 4 * 1024 * 1024;
/// Default capture cap for worker stderr (64 KiB)
pub const DEFAULT_STDERR_CAP_BYTES: usize = 64 * 1024;
/// Time a worker gets to exit after SIGTERM before the group is killed
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// Capture limits for worker output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub stdout_cap_bytes: usize,
    pub stderr_cap_bytes: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            stdout_cap_bytes: DEFAULT_STDOUT_CAP_BYTES,
            stderr_cap_bytes: DEFAULT_STDERR_CAP_BYTES,
        }
    }
}

// ============================================================================
// NativeRunner - direct worker execution
// ============================================================================

/// Native process runner built on `tokio::process`.
///
/// Each run spawns the worker in its own process group (Unix) so a timeout or
/// an abandoned attempt takes down the worker and anything it forked, such as
/// a headless browser.
///
/// # Example
///
/// ```rust,no_run
/// use followfetch_runner::{CommandSpec, NativeRunner, ProcessRunner};
/// use std::time::Duration;
///
/// # async fn example() {
/// let runner = NativeRunner::new();
/// let cmd = CommandSpec::new("python3").args(["scripts/method2_wrapper.py", "alice"]);
/// let output = runner.run(&cmd, Duration::from_secs(120)).await.unwrap();
/// println!("{}", output.stdout_string());
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NativeRunner {
    buffer_config: BufferConfig,
    kill_grace: Duration,
}

impl Default for NativeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRunner {
    /// Create a runner with default capture caps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_config: BufferConfig::default(),
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Create a runner with explicit capture caps.
    #[must_use]
    pub fn with_buffer_config(buffer_config: BufferConfig) -> Self {
        Self {
            buffer_config,
            ..Self::new()
        }
    }

    /// Override the SIGTERM grace period used on timeout.
    #[must_use]
    pub fn with_kill_grace(mut self, kill_grace: Duration) -> Self {
        self.kill_grace = kill_grace;
        self
    }

    #[must_use]
    pub const fn buffer_config(&self) -> BufferConfig {
        self.buffer_config
    }

    /// Terminate a timed-out worker: TERM the group, give it `kill_grace`, then KILL.
    async fn terminate(&self, child: &mut Child, group: &mut ProcessGroupGuard) {
        group.signal_term();

        if timeout(self.kill_grace, child.wait()).await.is_err() {
            tracing::debug!("worker ignored SIGTERM, killing process group");
            let _ = child.start_kill();
        }

        // Sweep anything the worker forked, then reap.
        group.kill();
        let _ = child.wait().await;
        group.disarm();
    }
}

#[async_trait]
impl ProcessRunner for NativeRunner {
    async fn run(&self, cmd: &CommandSpec, limit: Duration) -> Result<ProcessOutput, RunnerError> {
        let mut command = cmd.to_tokio_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: cmd.program_display(),
            reason: e.to_string(),
        })?;
        let mut group = ProcessGroupGuard::new(child.id());

        let stdout_pipe = child.stdout.take().ok_or_else(|| RunnerError::Io {
            reason: "Failed to capture stdout".to_string(),
        })?;
        let stderr_pipe = child.stderr.take().ok_or_else(|| RunnerError::Io {
            reason: "Failed to capture stderr".to_string(),
        })?;

        let caps = self.buffer_config;
        let capture = async {
            let (stdout, stderr) = tokio::try_join!(
                read_capped(stdout_pipe, caps.stdout_cap_bytes),
                read_capped(stderr_pipe, caps.stderr_cap_bytes),
            )?;
            let status = child.wait().await.map_err(|e| RunnerError::Io {
                reason: format!("Failed to wait for process: {e}"),
            })?;
            Ok::<_, RunnerError>((status, stdout, stderr))
        };

        match timeout(limit, capture).await {
            Ok(Ok((status, stdout, stderr))) => {
                group.disarm();
                let truncated = stdout.was_truncated();
                Ok(
                    ProcessOutput::new(stdout.into_bytes(), stderr.into_bytes(), status.code())
                        .with_stdout_truncated(truncated),
                )
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                self.terminate(&mut child, &mut group).await;
                Err(RunnerError::Timeout {
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }
}

async fn read_capped<R>(mut pipe: R, cap: usize) -> Result<RingBuffer, RunnerError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = RingBuffer::new(cap);
    let mut chunk = vec![0u8; 8192];

    loop {
        let n = pipe.read(&mut chunk).await.map_err(|e| RunnerError::Io {
            reason: format!("Failed to read worker output: {e}"),
        })?;
        if n == 0 {
            break;
        }
        buffer.write(&chunk[..n]);
    }

    Ok(buffer)
}

/// Kills the worker's process group when dropped while still armed.
///
/// This is what makes an abandoned `run` future (request cancellation) take the
/// worker down with it. `kill_on_drop` only reaches the direct child.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    #[cfg(unix)]
    fn send(&self, signal: nix::sys::signal::Signal) {
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        if let Some(pgid) = self.pgid
            && let Ok(raw) = i32::try_from(pgid)
        {
            let _ = killpg(Pid::from_raw(raw), signal);
        }
    }

    fn signal_term(&self) {
        #[cfg(unix)]
        self.send(nix::sys::signal::Signal::SIGTERM);
    }

    fn kill(&self) {
        #[cfg(unix)]
        self.send(nix::sys::signal::Signal::SIGKILL);
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if self.pgid.is_some() {
            self.kill();
        }
    }
}

//! Shell Command Adapter
//!
//! Implements the `CommandRunner` port by running command lines through a
//! shell with a wall-clock budget. A command that overruns is killed and
//! reported with whatever it wrote to stderr so far.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::domain::CommandRunner;
use crate::error::{Error, Result};

/// Default command budget.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the shell runner
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Shell used to interpret command lines (invoked as `<shell> -c <line>`)
    pub shell: String,
    /// Wall-clock budget per command
    pub timeout: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell: "bash".to_string(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Runs commands as child processes of a shell.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner {
    config: ShellConfig,
}

impl ShellCommandRunner {
    /// Create a runner with the given configuration.
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    #[instrument(skip(self), fields(timeout_secs = self.config.timeout.as_secs()))]
    async fn run(&self, command: &str) -> Result<String> {
        debug!("Executing command");

        let mut child = Command::new(&self.config.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CommandFailed {
                command: command.to_string(),
                reason: format!("failed to launch {}: {}", self.config.shell, e),
            })?;

        let mut stdout = PipeCapture::spawn(child.stdout.take());
        let mut stderr = PipeCapture::spawn(child.stderr.take());

        let outcome = tokio::time::timeout(self.config.timeout, async {
            let status = child.wait().await?;
            stdout.wait().await;
            stderr.wait().await;
            Ok::<_, std::io::Error>(status)
        })
        .await;

        match outcome {
            Ok(Ok(status)) if status.success() => Ok(stdout.contents()),
            Ok(Ok(status)) => {
                let stderr = stderr.contents();
                debug!(%status, stderr = %stderr.trim(), "Command failed");
                Err(Error::CommandFailed {
                    command: command.to_string(),
                    reason: format!("{}: {}", status, stderr.trim()),
                })
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                stdout.abort();
                stderr.abort();
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed out command");
                }
                Err(Error::CommandTimeout {
                    command: command.to_string(),
                    timeout_secs: self.config.timeout.as_secs(),
                    stderr: stderr.contents().trim().to_string(),
                })
            }
        }
    }
}

// =============================================================================
// Pipe Capture
// =============================================================================

/// Drains a child pipe in the background into a shared buffer, so partial
/// output is still available if the child is killed.
struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl PipeCapture {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();

        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                    Err(e) => {
                        debug!(error = %e, "Pipe read failed");
                        break;
                    }
                }
            }
        });

        Self { buffer, task }
    }

    async fn wait(&mut self) {
        if let Err(e) = (&mut self.task).await {
            debug!(error = %e, "Pipe reader did not finish cleanly");
        }
    }

    fn abort(&self) {
        self.task.abort();
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

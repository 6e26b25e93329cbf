//! External process execution with a hard timeout
use crate::error::{ArtworkError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Turn a non-zero exit into [`ArtworkError::ProcessFailed`]
    pub fn check(self, program: &Path) -> Result<Self> {
        if self.status.success() {
            return Ok(self);
        }
        Err(ArtworkError::ProcessFailed {
            program: program.display().to_string(),
            status: self.status.to_string(),
            stderr: self.stderr_lossy(),
        })
    }
}

/// Runs an external command to completion or until the timeout expires
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`.
    ///
    /// A non-zero exit is *not* an error here; callers decide via
    /// [`ProcessOutput::check`]. Exceeding `timeout` is
    /// [`ArtworkError::ProcessTimeout`] and the process is gone by the time it
    /// is returned.
    async fn run(&self, program: &Path, args: &[OsString], timeout: Duration)
        -> Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[OsString],
        timeout: Duration,
    ) -> Result<ProcessOutput> {
        tracing::debug!("Running {} {:?}", program.display(), args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = tokio::time::timeout(timeout, async {
            tokio::try_join!(child.wait(), drain(stdout), drain(stderr))
        })
        .await;

        match finished {
            Ok(result) => {
                let (status, stdout, stderr) = result?;
                Ok(ProcessOutput {
                    status,
                    stdout,
                    stderr,
                })
            }
            Err(_) => {
                // kill() also waits, so the child is reaped before we return
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill {}: {}", program.display(), e);
                }
                Err(ArtworkError::ProcessTimeout {
                    program: program.display().to_string(),
                    timeout,
                })
            }
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

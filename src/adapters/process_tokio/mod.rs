//! Tokio process runner
//!
//! Spawns ffmpeg/ffprobe with `tokio::process`. Stdout can be streamed line by
//! line while stderr is drained concurrently so neither pipe fills up.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::ports::*;

/// Process runner backed by `tokio::process::Command`
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &ProcessInvocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(invocation: &ProcessInvocation, err: std::io::Error) -> DomainError {
        DomainError::Spawn {
            program: invocation.program.to_string_lossy().to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, DomainError> {
        debug!(program = %invocation.program.display(), args = ?invocation.args, "Running process");

        let output = Self::command(invocation)
            .output()
            .await
            .map_err(|e| Self::spawn_error(invocation, e))?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn run_streaming(
        &self,
        invocation: &ProcessInvocation,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ProcessOutput, DomainError> {
        debug!(program = %invocation.program.display(), args = ?invocation.args, "Running process (streaming)");

        let mut child = Self::command(invocation)
            .spawn()
            .map_err(|e| Self::spawn_error(invocation, e))?;

        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buffer = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buffer).await;
            }
            buffer
        });

        let mut stdout_log = String::new();
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut raw = Vec::new();
            loop {
                raw.clear();
                match reader.read_until(b'\n', &mut raw).await {
                    Ok(0) => break,
                    Ok(_) => {
                        // Encoders may emit non-UTF-8 metadata; keep reading regardless
                        let decoded = String::from_utf8_lossy(&raw);
                        let line = decoded.trim_end_matches(['\n', '\r']);
                        on_line(line);
                        stdout_log.push_str(line);
                        stdout_log.push('\n');
                    }
                    Err(e) => {
                        warn!(program = %invocation.program.display(), "Stopped reading stdout: {}", e);
                        break;
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Self::spawn_error(invocation, e))?;
        let stderr = stderr_task.await.unwrap_or_default();

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout: stdout_log,
            stderr,
        })
    }
}

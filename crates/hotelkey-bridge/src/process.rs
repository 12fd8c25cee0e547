//! Subprocess-backed bridge transport.

use crate::{BridgeError, BridgeTransport, RawOutput, Result};
use hotelkey_protocol::Invocation;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs the bridge executable, one process per invocation.
///
/// Arguments are passed positionally and never logged: the credential
/// payload travels on the command line.
#[derive(Debug, Clone)]
pub struct ProcessBridge {
    program: PathBuf,
}

impl ProcessBridge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl BridgeTransport for ProcessBridge {
    async fn invoke(&self, invocation: &Invocation, timeout: Duration) -> Result<RawOutput> {
        let command = invocation.kind().name();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let mut child = Command::new(&self.program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BridgeError::spawn_failure(self.program.display().to_string(), e.to_string())
            })?;

        debug!(command, pid = ?child.id(), "Bridge process started");

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let outcome = {
            let run = async {
                tokio::try_join!(
                    child.wait(),
                    read_pipe(stdout_pipe),
                    read_pipe(stderr_pipe)
                )
            };
            tokio::time::timeout(timeout, run).await
        };

        match outcome {
            Ok(Ok((status, stdout, stderr))) => {
                if status.success() {
                    debug!(command, "Bridge process finished");
                    Ok(RawOutput { stdout, stderr })
                } else {
                    warn!(
                        command,
                        exit_code = ?status.code(),
                        stderr = %stderr.trim(),
                        "Bridge process failed"
                    );
                    Err(BridgeError::transport_failure(status.code(), stderr.trim()))
                }
            }
            Ok(Err(e)) => {
                warn!(command, error = %e, "Failed to collect bridge output");
                Err(BridgeError::Io(e))
            }
            Err(_) => {
                warn!(command, timeout_ms, "Bridge process timed out, killing");
                if let Err(e) = child.start_kill() {
                    debug!(command, error = %e, "Kill failed, process already exited");
                }
                if let Err(e) = child.wait().await {
                    warn!(command, error = %e, "Failed to reap bridge process");
                }
                Err(BridgeError::timeout(command, timeout_ms))
            }
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

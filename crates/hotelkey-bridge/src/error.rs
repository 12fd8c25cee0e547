//! Error types for bridge invocations.

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while running the bridge executable.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The process could not be started.
    #[error("Failed to start bridge '{program}': {message}")]
    SpawnFailure { program: String, message: String },

    /// The process exited unsuccessfully or was terminated by a signal.
    #[error("Bridge failed ({}): {stderr}", describe_exit(.exit_code))]
    TransportFailure {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The process did not finish in time and was killed.
    #[error("Bridge command '{command}' timed out after {duration_ms}ms")]
    Timeout {
        command: &'static str,
        duration_ms: u64,
    },

    /// Reading the process output failed.
    #[error("Bridge I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn spawn_failure(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailure {
            program: program.into(),
            message: message.into(),
        }
    }

    pub fn transport_failure(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::TransportFailure {
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn timeout(command: &'static str, duration_ms: u64) -> Self {
        Self::Timeout {
            command,
            duration_ms,
        }
    }

    /// Failures worth retrying when opening the port.
    ///
    /// Spawn failures are excluded: a missing executable stays missing.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportFailure { .. } | Self::Timeout { .. })
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_transport_failure_display() {
        let error = BridgeError::transport_failure(Some(1), "port busy");
        assert_eq!(error.to_string(), "Bridge failed (exit status 1): port busy");

        let error = BridgeError::transport_failure(None, "");
        assert_eq!(error.to_string(), "Bridge failed (terminated by signal): ");
    }

    #[test]
    fn test_timeout_display() {
        let error = BridgeError::timeout("connect", 10_000);
        assert_eq!(
            error.to_string(),
            "Bridge command 'connect' timed out after 10000ms"
        );
    }

    #[rstest]
    #[case(BridgeError::transport_failure(Some(2), ""), true)]
    #[case(BridgeError::transport_failure(None, ""), true)]
    #[case(BridgeError::timeout("connect", 1), true)]
    #[case(BridgeError::spawn_failure("bridge.exe", "not found"), false)]
    #[case(BridgeError::Io(std::io::Error::other("pipe closed")), false)]
    fn test_transport_classification(#[case] error: BridgeError, #[case] expected: bool) {
        assert_eq!(error.is_transport(), expected);
    }
}

use std::fmt::{self, Display};

/// A central error enum for connection-related errors.
#[derive(Debug)]
pub enum ConnectionError {
    IoError(std::io::Error),
    /// The SSH session could not be established or used.
    SshError(String),
    /// The server's host key was rejected by the configured policy.
    HostKeyError(String),
    /// The local end of a port-forward could not be set up.
    ForwardError(String),
    /// The store refused the connection or the liveness probe.
    StoreError(String),
    ConfigError(String),
    Other(String),
}

impl ConnectionError {
    /// The underlying reason without the layer prefix, for user-facing messages.
    pub fn reason(&self) -> String {
        match self {
            ConnectionError::IoError(e) => e.to_string(),
            ConnectionError::SshError(msg)
            | ConnectionError::HostKeyError(msg)
            | ConnectionError::ForwardError(msg)
            | ConnectionError::StoreError(msg)
            | ConnectionError::ConfigError(msg)
            | ConnectionError::Other(msg) => msg.clone(),
        }
    }
}

/// Convert from std::io::Error.
impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> ConnectionError {
        ConnectionError::IoError(err)
    }
}

/// Convert from ssh2::Error.
/// Without this, `?` on libssh2 calls won't work inside the SSH session code.
#[cfg(feature = "ssh")]
impl From<ssh2::Error> for ConnectionError {
    fn from(err: ssh2::Error) -> Self {
        ConnectionError::SshError(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for ConnectionError {
    fn from(err: redis::RedisError) -> Self {
        ConnectionError::StoreError(err.to_string())
    }
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::IoError(e) => write!(f, "IO error: {}", e),
            ConnectionError::SshError(msg) => write!(f, "SSH error: {}", msg),
            ConnectionError::HostKeyError(msg) => write!(f, "Host key error: {}", msg),
            ConnectionError::ForwardError(msg) => write!(f, "Forward error: {}", msg),
            ConnectionError::StoreError(msg) => write!(f, "Store error: {}", msg),
            ConnectionError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            ConnectionError::Other(msg) => write!(f, "Other error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err: ConnectionError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "IO error: port taken");
    }

    #[test]
    fn display_names_the_failing_layer() {
        assert_eq!(
            ConnectionError::StoreError("NOAUTH".into()).to_string(),
            "Store error: NOAUTH"
        );
        assert_eq!(
            ConnectionError::SshError("timed out".into()).to_string(),
            "SSH error: timed out"
        );
        assert_eq!(ConnectionError::SshError("timed out".into()).reason(), "timed out");
    }
}

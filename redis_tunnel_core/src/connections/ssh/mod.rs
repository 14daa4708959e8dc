//! SSH capability used by the tunneled connect path.
//!
//! The traits only cover what the connector needs: open a session, ask
//! whether it is usable, and add a local port-forward. Dropping a forward
//! stops it; dropping a session disconnects it.

use std::fmt;
use std::path::Path;

use crate::connections::errors::ConnectionError;
use crate::core::config::HostKeyPolicy;

#[cfg(feature = "ssh")]
pub mod forwarding;
#[cfg(feature = "ssh")]
pub mod ssh_session;

#[cfg(feature = "ssh")]
pub use forwarding::LocalForward;
#[cfg(feature = "ssh")]
pub use ssh_session::{Ssh2Session, Ssh2Transport};

/// Everything needed to open an SSH session.
#[derive(Clone, Copy)]
pub struct SshTarget<'a> {
    pub host: &'a str,
    pub port: u16,
    pub user: &'a str,
    pub password: &'a str,
    pub host_key_policy: HostKeyPolicy,
    /// `None` means `~/.ssh/known_hosts`.
    pub known_hosts_file: Option<&'a Path>,
}

impl fmt::Debug for SshTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("host_key_policy", &self.host_key_policy)
            .field("known_hosts_file", &self.known_hosts_file)
            .finish_non_exhaustive()
    }
}

/// A local port-forward: connections to `local_addr:local_port` are carried
/// through the session to `remote_addr:remote_port` as seen from the SSH server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRule {
    pub local_addr: String,
    pub local_port: u16,
    pub remote_addr: String,
    pub remote_port: u16,
}

impl ForwardRule {
    /// `127.0.0.1:port` on both ends.
    pub fn loopback(port: u16) -> Self {
        Self {
            local_addr: "127.0.0.1".into(),
            local_port: port,
            remote_addr: "127.0.0.1".into(),
            remote_port: port,
        }
    }
}

/// Constructs (but does not connect) SSH sessions.
pub trait SshTransport {
    type Session: SshSession;

    fn session(&self, target: &SshTarget<'_>) -> Self::Session;
}

pub trait SshSession {
    /// Handle for a running forward. Dropping it stops forwarding.
    type Forward;

    /// Handshake, host key check and authentication.
    fn connect(&mut self) -> Result<(), ConnectionError>;

    fn is_connected(&self) -> bool;

    /// Add the forward to this session and start it.
    fn forward_local(&mut self, rule: &ForwardRule) -> Result<Self::Forward, ConnectionError>;
}

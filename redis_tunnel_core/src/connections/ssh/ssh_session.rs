use std::net::TcpStream;
use std::path::PathBuf;

use directories::BaseDirs;
use log::{debug, info, warn};
use ssh2::{CheckResult, HashType, KnownHostFileKind, Session};

use super::forwarding::LocalForward;
use super::{ForwardRule, SshSession, SshTarget, SshTransport};
use crate::connections::errors::ConnectionError;
use crate::core::config::HostKeyPolicy;

/// [`SshTransport`] backed by libssh2.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ssh2Transport;

impl SshTransport for Ssh2Transport {
    type Session = Ssh2Session;

    fn session(&self, target: &SshTarget<'_>) -> Ssh2Session {
        Ssh2Session::new(target)
    }
}

/// Password-authenticated SSH session. Disconnects on drop.
pub struct Ssh2Session {
    host: String,
    port: u16,
    username: String,
    password: String,
    host_key_policy: HostKeyPolicy,
    known_hosts_file: Option<PathBuf>,

    session: Option<Session>,
}

impl Ssh2Session {
    pub fn new(target: &SshTarget<'_>) -> Self {
        Self {
            host: target.host.to_string(),
            port: target.port,
            username: target.user.to_string(),
            password: target.password.to_string(),
            host_key_policy: target.host_key_policy,
            known_hosts_file: target.known_hosts_file.map(PathBuf::from),
            session: None,
        }
    }

    fn known_hosts_path(&self) -> Result<PathBuf, ConnectionError> {
        if let Some(path) = &self.known_hosts_file {
            return Ok(path.clone());
        }
        let dirs = BaseDirs::new().ok_or_else(|| {
            ConnectionError::HostKeyError("unable to locate the home directory".into())
        })?;
        Ok(dirs.home_dir().join(".ssh").join("known_hosts"))
    }

    /// Answer the host-key question according to the configured policy.
    fn verify_host_key(&self, session: &Session) -> Result<(), ConnectionError> {
        let (key, _kind) = session.host_key().ok_or_else(|| {
            ConnectionError::HostKeyError("server did not present a host key".into())
        })?;

        match self.host_key_policy {
            HostKeyPolicy::InsecureTrustOnFirstUse => {
                let fingerprint = session
                    .host_key_hash(HashType::Sha256)
                    .map(hex_fingerprint)
                    .unwrap_or_else(|| "<unavailable>".into());
                warn!(
                    "Accepting unverified host key for {}:{} (SHA256 {})",
                    self.host, self.port, fingerprint
                );
                Ok(())
            }
            HostKeyPolicy::KnownHosts => {
                let path = self.known_hosts_path()?;
                let mut known_hosts = session.known_hosts()?;
                known_hosts
                    .read_file(&path, KnownHostFileKind::OpenSSH)
                    .map_err(|e| {
                        ConnectionError::HostKeyError(format!(
                            "cannot read {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                match known_hosts.check_port(&self.host, self.port, key) {
                    CheckResult::Match => {
                        debug!("Host key for {}:{} matches {}", self.host, self.port, path.display());
                        Ok(())
                    }
                    CheckResult::NotFound => Err(ConnectionError::HostKeyError(format!(
                        "{}:{} is not listed in {}",
                        self.host,
                        self.port,
                        path.display()
                    ))),
                    CheckResult::Mismatch => Err(ConnectionError::HostKeyError(format!(
                        "host key for {}:{} does not match {}",
                        self.host,
                        self.port,
                        path.display()
                    ))),
                    CheckResult::Failure => Err(ConnectionError::HostKeyError(
                        "known_hosts check failed".into(),
                    )),
                }
            }
        }
    }
}

impl SshSession for Ssh2Session {
    type Forward = LocalForward;

    fn connect(&mut self) -> Result<(), ConnectionError> {
        let addr = format!("{}:{}", self.host, self.port);
        info!("Connecting to SSH server at {}", addr);

        let tcp = TcpStream::connect(&addr)?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        self.verify_host_key(&session)?;
        session.userauth_password(&self.username, &self.password)?;
        if !session.authenticated() {
            return Err(ConnectionError::SshError("SSH authentication failed".into()));
        }

        info!("SSH connection established");
        self.session = Some(session);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.authenticated())
    }

    fn forward_local(&mut self, rule: &ForwardRule) -> Result<LocalForward, ConnectionError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| ConnectionError::SshError("Not connected".into()))?;
        LocalForward::start(session.clone(), rule)
    }
}

impl Drop for Ssh2Session {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.set_blocking(true);
            let _ = session.disconnect(None, "closing", None);
            debug!("SSH session to {}:{} closed", self.host, self.port);
        }
    }
}

fn hex_fingerprint(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

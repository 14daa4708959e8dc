use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::connections::errors::ConnectionError;
use crate::connections::ssh::SshTarget;
use crate::core::messages::Language;

/// How the SSH host key is checked before authenticating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Verify against an OpenSSH `known_hosts` file.
    #[default]
    KnownHosts,
    /// Accept whatever key the server presents. Anyone able to intercept the
    /// connection can impersonate the server and read the passwords.
    InsecureTrustOnFirstUse,
}

/// Where and how to connect.
///
/// Passwords are read when deserializing but never written back out; profile
/// storage keeps them in the OS keyring instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub store_host: String,
    pub store_port: u16,
    #[serde(skip_serializing)]
    pub store_password: String,
    pub store_db: u32,

    pub debug: bool,
    pub language: Language,

    pub tunnel_enabled: bool,
    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    #[serde(skip_serializing)]
    pub ssh_password: String,
    pub host_key_policy: HostKeyPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_hosts_file: Option<PathBuf>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            store_host: "127.0.0.1".into(),
            store_port: 6379,
            store_password: String::new(),
            store_db: 0,
            debug: false,
            language: Language::English,
            tunnel_enabled: false,
            ssh_host: "127.0.0.1".into(),
            ssh_port: 22,
            ssh_user: "root".into(),
            ssh_password: String::new(),
            host_key_policy: HostKeyPolicy::KnownHosts,
            known_hosts_file: None,
        }
    }
}

impl ConnectionConfig {
    /// Direct connection to `host:port`, everything else defaulted.
    pub fn direct(host: impl Into<String>, port: u16) -> Self {
        Self {
            store_host: host.into(),
            store_port: port,
            ..Self::default()
        }
    }

    /// Enable the tunnel through `user@host:port` with password authentication.
    pub fn with_tunnel(
        mut self,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.tunnel_enabled = true;
        self.ssh_host = host.into();
        self.ssh_port = port;
        self.ssh_user = user.into();
        self.ssh_password = password.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.store_host.trim().is_empty() {
            return Err(ConnectionError::ConfigError("store host is empty".into()));
        }
        if self.store_port == 0 {
            return Err(ConnectionError::ConfigError(
                "store port must be between 1 and 65535".into(),
            ));
        }
        if self.tunnel_enabled {
            if self.ssh_host.trim().is_empty() {
                return Err(ConnectionError::ConfigError("SSH host is empty".into()));
            }
            if self.ssh_port == 0 {
                return Err(ConnectionError::ConfigError(
                    "SSH port must be between 1 and 65535".into(),
                ));
            }
            if self.ssh_user.is_empty() {
                return Err(ConnectionError::ConfigError("SSH user is empty".into()));
            }
        }
        Ok(())
    }

    pub fn ssh_target(&self) -> SshTarget<'_> {
        SshTarget {
            host: &self.ssh_host,
            port: self.ssh_port,
            user: &self.ssh_user,
            password: &self.ssh_password,
            host_key_policy: self.host_key_policy,
            known_hosts_file: self.known_hosts_file.as_deref().map(Path::new),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::core::config::ConnectionConfig;

/// A user-named connection preset.
///
/// JSON looks like:
/// `{ "name":"prod", "store_host":"127.0.0.1", "store_port":6379, "tunnel_enabled":true, ... }`
/// Passwords are not part of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(flatten)]
    pub config: ConnectionConfig,
}

impl Profile {
    pub fn new(name: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// Returns the unique, human-readable identifier.
    pub fn name(&self) -> &str {
        &self.name
    }
}

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

/// Which password of a profile a secret belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretSlot {
    Store,
    Ssh,
}

impl SecretSlot {
    fn as_str(self) -> &'static str {
        match self {
            SecretSlot::Store => "store",
            SecretSlot::Ssh => "ssh",
        }
    }
}

/// Where profile passwords live.
pub trait SecretStore {
    fn get(&self, profile: &str, slot: SecretSlot) -> io::Result<Option<String>>;
    fn set(&self, profile: &str, slot: SecretSlot, secret: &str) -> io::Result<()>;
    /// Removing a missing secret is not an error.
    fn delete(&self, profile: &str, slot: SecretSlot) -> io::Result<()>;
}

/// The platform credential store (Keychain, Credential Manager, keyutils).
#[derive(Debug, Clone)]
pub struct KeyringSecrets {
    service: String,
}

impl KeyringSecrets {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, profile: &str, slot: SecretSlot) -> io::Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &format!("{profile}:{}", slot.as_str()))
            .map_err(io::Error::other)
    }
}

impl Default for KeyringSecrets {
    fn default() -> Self {
        Self::new("redis_tunnel")
    }
}

impl SecretStore for KeyringSecrets {
    fn get(&self, profile: &str, slot: SecretSlot) -> io::Result<Option<String>> {
        match self.entry(profile, slot)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn set(&self, profile: &str, slot: SecretSlot, secret: &str) -> io::Result<()> {
        self.entry(profile, slot)?
            .set_password(secret)
            .map_err(io::Error::other)
    }

    fn delete(&self, profile: &str, slot: SecretSlot) -> io::Result<()> {
        match self.entry(profile, slot)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(io::Error::other(e)),
        }
    }
}

/// Process-local secrets, for tests and for callers that manage passwords themselves.
#[derive(Debug, Default)]
pub struct MemorySecrets {
    inner: Mutex<HashMap<(String, SecretSlot), String>>,
}

impl MemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecrets {
    fn get(&self, profile: &str, slot: SecretSlot) -> io::Result<Option<String>> {
        let map = self.inner.lock().map_err(|_| io::Error::other("secret store poisoned"))?;
        Ok(map.get(&(profile.to_string(), slot)).cloned())
    }

    fn set(&self, profile: &str, slot: SecretSlot, secret: &str) -> io::Result<()> {
        let mut map = self.inner.lock().map_err(|_| io::Error::other("secret store poisoned"))?;
        map.insert((profile.to_string(), slot), secret.to_string());
        Ok(())
    }

    fn delete(&self, profile: &str, slot: SecretSlot) -> io::Result<()> {
        let mut map = self.inner.lock().map_err(|_| io::Error::other("secret store poisoned"))?;
        map.remove(&(profile.to_string(), slot));
        Ok(())
    }
}

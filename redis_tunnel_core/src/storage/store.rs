use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::warn;
use serde_json::Error as SerdeError;

use super::profile::Profile;
use super::secrets::{KeyringSecrets, SecretSlot, SecretStore};

#[derive(Debug, Clone)]
pub struct ProfileStore<S = KeyringSecrets> {
    dir: PathBuf,
    secrets: S,
}

impl ProfileStore {
    /// `~/.config/redis_tunnel/profiles` on Linux, `%APPDATA%\redis_tunnel\profiles` on Windows, etc.
    pub fn new() -> io::Result<Self> {
        let proj = ProjectDirs::from("", "", "redis_tunnel")
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Unable to locate config dir"))?;
        Self::open(proj.config_dir().join("profiles"), KeyringSecrets::default())
    }
}

impl<S: SecretStore> ProfileStore<S> {
    /// Use `dir` for profile files and `secrets` for passwords.
    pub fn open(dir: impl Into<PathBuf>, secrets: S) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, secrets })
    }

    pub fn secrets(&self) -> &S {
        &self.secrets
    }

    fn file_for(&self, name: &str) -> io::Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid profile name '{name}'"),
            ));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    fn read_file(path: &Path) -> io::Result<Profile> {
        fs::File::open(path).and_then(|f| serde_json::from_reader(f).map_err(SerdeError::into))
    }

    fn fill_secrets(&self, profile: &mut Profile) -> io::Result<()> {
        if let Some(pw) = self.secrets.get(&profile.name, SecretSlot::Store)? {
            profile.config.store_password = pw;
        }
        if let Some(pw) = self.secrets.get(&profile.name, SecretSlot::Ssh)? {
            profile.config.ssh_password = pw;
        }
        Ok(())
    }

    /// Returns every stored profile (skips malformed files with a warning).
    /// Passwords are not loaded; use [`load`](Self::load) for a connectable profile.
    pub fn list(&self) -> io::Result<Vec<Profile>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match Self::read_file(&path) {
                Ok(mut profile) => {
                    // Same rule as `load`: the file name is authoritative.
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        profile.name = stem.to_string();
                    }
                    out.push(profile);
                }
                Err(e) => warn!("Could not read {:?}: {e}", path),
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Load one profile with its passwords. `Ok(None)` if it doesn't exist.
    pub fn load(&self, name: &str) -> io::Result<Option<Profile>> {
        let path = self.file_for(name)?;
        let mut profile = match Self::read_file(&path) {
            Ok(profile) => profile,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        // The file name is authoritative.
        profile.name = name.to_string();
        self.fill_secrets(&mut profile)?;
        Ok(Some(profile))
    }

    /// Create or overwrite a profile. Empty passwords clear the stored secret.
    pub fn save(&self, profile: &Profile) -> io::Result<()> {
        let path = self.file_for(profile.name())?;
        for (slot, secret) in [
            (SecretSlot::Store, &profile.config.store_password),
            (SecretSlot::Ssh, &profile.config.ssh_password),
        ] {
            if secret.is_empty() {
                self.secrets.delete(profile.name(), slot)?;
            } else {
                self.secrets.set(profile.name(), slot, secret)?;
            }
        }
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, profile).map_err(SerdeError::into)
    }

    /// Delete a preset and its secrets (`Ok(true)` if removed, `Ok(false)` if it didn't exist).
    pub fn delete(&self, name: &str) -> io::Result<bool> {
        let path = self.file_for(name)?;
        self.secrets.delete(name, SecretSlot::Store)?;
        self.secrets.delete(name, SecretSlot::Ssh)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

pub mod profile;
pub mod secrets;
pub mod store;

pub use profile::Profile;
pub use secrets::{KeyringSecrets, MemorySecrets, SecretSlot, SecretStore};
pub use store::ProfileStore;

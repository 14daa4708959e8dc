pub mod connections;
pub mod core;
pub mod storage;
pub mod utils;

// re‑export ergonomic entry points
pub use crate::connections::errors::ConnectionError;
pub use crate::core::config::{ConnectionConfig, HostKeyPolicy};
pub use crate::core::connector::{Callbacks, ConnectCallbacks, Connector, OnError, OnSuccess};
pub use crate::core::messages::Language;
pub use crate::storage::{Profile, ProfileStore};

#[cfg(feature = "redis")]
pub use crate::connections::redis_store::{RedisHandle, RedisStore};
#[cfg(feature = "ssh")]
pub use crate::connections::ssh::Ssh2Transport;

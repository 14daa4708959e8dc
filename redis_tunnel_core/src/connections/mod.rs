pub mod errors;
pub mod ssh;
pub mod store;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use errors::*;
pub use store::*;

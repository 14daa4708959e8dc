pub mod clock;
pub mod config;
pub mod connector;
pub mod messages;

pub use clock::*;
pub use config::*;
pub use connector::*;
pub use messages::*;

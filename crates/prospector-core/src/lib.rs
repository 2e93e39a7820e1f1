pub mod config;
pub mod error;
pub mod events;
pub mod protocols;
pub mod queue;
pub mod types;

pub use config::AppConfig;
pub use error::{ProspectorError, Result};
pub use protocols::{ProtocolDescriptor, ProtocolRegistry, TokenSource};
pub use queue::BoundedQueue;

//! Configuration control plane for a config-driven gateway.

pub mod admin;
pub mod config;
pub mod decode;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod service;
pub mod store;

pub use config::schema::CanonicalConfig;
pub use decode::parser::{DocumentFormat, RawDocument};
pub use lifecycle::Shutdown;
pub use service::ConfigService;
pub use store::ConfigStore;

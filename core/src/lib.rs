pub mod bus;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod follow_up;
pub mod handlers;
pub mod host;
pub mod parser;
pub mod payload;
pub mod registry;

// Re-exports for convenience
pub use bus::{BusLifecycle, CommandBus, DrainReport, LineFailure};
pub use client::BridgeClient;
pub use config::{BusConfig, ConfigManager, ConfigOverrides};
pub use dispatch::Dispatcher;
pub use error::BusError;
pub use host::{Host, HostError, JsonLinesHost, RecordingHost};
pub use parser::{parse_line, Command};

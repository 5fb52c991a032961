pub mod client;
pub mod config;
pub mod error;
pub mod monitor;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use client::BackendClient;
pub use config::{Config, ViewVariant};
pub use error::BackendError;
pub use monitor::{ConnectivityMonitor, MonitorHandle};
pub use session::{Notice, NoticeKind, Session};
pub use state::{ChatMessage, ChatRole, ConnectionStatus, Conversation};

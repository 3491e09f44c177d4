//! Telegram client for elizaOS.
//!
//! This crate contains:
//! - The `CREATE_POLL` action, which turns `/poll` and `/createpoll` chat
//!   commands into a platform-agnostic poll description
//! - The action contract and the runtime seam actions are registered through
//! - Configuration and error types
//! - A native (`tokio` + `teloxide`) delivery service and client wiring when
//!   the `native` feature is enabled

#![warn(missing_docs)]
#![deny(unsafe_code)]

/// Action interfaces and built-in actions.
pub mod actions;
/// Configuration types and helpers for the Telegram client.
pub mod config;
/// Error types returned by the Telegram client.
pub mod error;
/// Agent runtime seam, action registry and message routing.
pub mod runtime;
/// Serializable types exchanged with the runtime and the delivery layer.
pub mod types;

#[cfg(feature = "native")]
/// Client start/stop wiring (requires the `native` feature).
pub mod client;

#[cfg(feature = "native")]
/// Native Telegram service implementation (requires the `native` feature).
pub mod service;

pub use actions::{parse_poll, CreatePollAction, HandlerCallback, TelegramAction};
pub use config::TelegramConfig;
pub use error::{PollError, Result, TelegramError};
pub use runtime::{process_message, ActionRegistry, AgentRuntime, InMemoryRuntime};
pub use types::*;

#[cfg(feature = "native")]
pub use client::TelegramClient;
#[cfg(feature = "native")]
pub use service::TelegramService;

/// Canonical plugin name.
pub const PLUGIN_NAME: &str = "telegram";
/// Plugin version (from Cargo package metadata).
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Human-friendly plugin description.
pub const PLUGIN_DESCRIPTION: &str = "Telegram client with poll creation for elizaOS agents";

/// Returns the plugin metadata used by the elizaOS plugin system.
pub fn plugin() -> Plugin {
    Plugin {
        name: PLUGIN_NAME.to_string(),
        description: PLUGIN_DESCRIPTION.to_string(),
        version: PLUGIN_VERSION.to_string(),
        actions: actions::get_all_actions()
            .iter()
            .map(|a| a.name().to_string())
            .collect(),
    }
}

#[derive(Debug, Clone)]
/// Plugin metadata (name, description, version and provided actions).
pub struct Plugin {
    /// The plugin identifier (e.g. `"telegram"`).
    pub name: String,
    /// A human-friendly description of the plugin.
    pub description: String,
    /// The plugin version string.
    pub version: String,
    /// Names of the actions the plugin registers.
    pub actions: Vec<String>,
}

//! Client entry point
//!
//! Wires the poll action and the Telegram service into an agent runtime.

use std::sync::Arc;
use tracing::{debug, info};

use crate::actions::{CreatePollAction, TelegramAction};
use crate::config::TelegramConfig;
use crate::error::Result;
use crate::runtime::AgentRuntime;
use crate::service::TelegramService;

/// Starts and stops the Telegram client for a runtime.
pub struct TelegramClient;

impl TelegramClient {
    /// Validates the runtime's Telegram settings, registers the poll action
    /// and starts the service.
    pub async fn start(runtime: Arc<dyn AgentRuntime>) -> Result<TelegramService> {
        let config = TelegramConfig::from_runtime(runtime.as_ref()).await?;
        config.validate()?;

        register_poll_action(runtime.as_ref())?;

        let mut service = TelegramService::new(config, Arc::clone(&runtime));
        service.start().await?;

        info!(
            "Telegram client successfully started for character {}",
            runtime.character_name()
        );
        Ok(service)
    }

    /// Stops a running service.
    pub async fn stop(service: &mut TelegramService) -> Result<()> {
        service.stop().await
    }
}

/// Registers `CREATE_POLL` unless an earlier start already did.
fn register_poll_action(runtime: &dyn AgentRuntime) -> Result<()> {
    let action = CreatePollAction;
    if runtime.actions().iter().any(|a| a.name() == action.name()) {
        debug!(action = action.name(), "Action already registered");
        return Ok(());
    }
    runtime.register_action(Arc::new(action))
}

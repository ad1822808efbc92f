//! Notification channels

mod log;
mod telegram;

use std::path::Path;

use contracts::{ChannelKind, ContractError, DeliveryReport, NotificationChannel, NotifierConfig};

use crate::error::NotifierResult;

pub use log::LogChannel;
pub use telegram::{next_offset, start_requests, Chat, Message, TelegramChannel, Update};

/// Configured channel
pub enum AnyChannel {
    Log(LogChannel),
    Telegram(TelegramChannel),
}

impl AnyChannel {
    /// Build the channel selected in config
    ///
    /// # Errors
    /// Telegram needs its token variable set and a readable subscriber store.
    pub fn from_config(config: &NotifierConfig) -> NotifierResult<Self> {
        match config.channel {
            ChannelKind::Log => Ok(Self::Log(LogChannel::new())),
            ChannelKind::Telegram => {
                TelegramChannel::from_config(&config.telegram).map(Self::Telegram)
            }
        }
    }
}

impl NotificationChannel for AnyChannel {
    fn name(&self) -> &str {
        match self {
            AnyChannel::Log(c) => c.name(),
            AnyChannel::Telegram(c) => c.name(),
        }
    }

    async fn send_text(&mut self, text: &str) -> Result<DeliveryReport, ContractError> {
        match self {
            AnyChannel::Log(c) => c.send_text(text).await,
            AnyChannel::Telegram(c) => c.send_text(text).await,
        }
    }

    async fn send_artifact(
        &mut self,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<DeliveryReport, ContractError> {
        match self {
            AnyChannel::Log(c) => c.send_artifact(path, caption).await,
            AnyChannel::Telegram(c) => c.send_artifact(path, caption).await,
        }
    }

    async fn refresh_subscribers(&mut self) -> Result<DeliveryReport, ContractError> {
        match self {
            AnyChannel::Log(c) => c.refresh_subscribers().await,
            AnyChannel::Telegram(c) => c.refresh_subscribers().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            AnyChannel::Log(c) => c.close().await,
            AnyChannel::Telegram(c) => c.close().await,
        }
    }
}

//! Telegram client using teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::warn;

/// Sending half of the chat platform, as the relay sees it.
///
/// The router and the matching service only talk to Telegram through this
/// trait, so tests can substitute a recording fake.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send plain text into a chat. Returns the platform message id.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, String>;

    /// Send Markdown-formatted text into a chat.
    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<i64, String>;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send to chat {chat_id}: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Markdown)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send notice to chat {chat_id}: {e}");
                warn!("{}", msg);
                msg
            })
    }
}

//! The message router: one instance per private chat.
//!
//! Classifies each inbound event into a command or relayable content, then
//! either runs the command or forwards the content to the matched partner.

use std::sync::Arc;

use tracing::debug;

use crate::relay::command::Command;
use crate::relay::content::{extract_content, Content, UnsupportedContent};
use crate::relay::event::{ChatScope, Event};
use crate::relay::pairing::{MatchService, MissingPartner, NoPartnerAvailable, Session};
use crate::relay::telegram::Messenger;

/// Label prepended to every bot-originated notice.
const BOT_LABEL: &str = "RandChat";

/// Notice sent when an event can't be turned into relayable content.
pub(crate) const UNSUPPORTED_NOTICE: &str = "Messages of this type weren't supported.";

fn help_text(chat_id: i64) -> String {
    format!(
        "This is chat {chat_id}. I pair you with a random stranger for an \
         anonymous conversation.\n\
         /begin - look for a partner\n\
         /end - leave the current chat\n\
         /help - show this message"
    )
}

/// Send a bot notice into a chat: `*RandChat:* …` in Markdown mode. This is
/// the only formatting applied to bot-originated text.
pub(crate) async fn notify<M: Messenger>(messenger: &M, chat_id: i64, text: &str) {
    messenger
        .send_markdown(chat_id, &format!("*{BOT_LABEL}:* {text}"))
        .await
        .ok();
}

/// Transmit relayable content into a chat. The relay is narrower than the
/// client: only text goes out, everything else is refused here. Transport
/// failures are logged by the client and not surfaced.
pub(crate) async fn relay_content<M: Messenger>(
    messenger: &M,
    chat_id: i64,
    content: &Content,
) -> Result<(), UnsupportedContent> {
    match content {
        Content::Text { text } => {
            messenger.send_message(chat_id, text).await.ok();
            Ok(())
        }
        Content::Photo { .. } => Err(UnsupportedContent),
    }
}

/// Routes one private chat's inbound events.
pub struct Router<S: MatchService, M: Messenger> {
    chat_id: i64,
    service: Arc<S>,
    messenger: Arc<M>,
    stranger: Arc<S::Session>,
}

impl<S: MatchService, M: Messenger> Router<S, M> {
    /// Create the router for a chat, registering the chat's session with
    /// the matching service. Registration happens exactly once, here.
    pub fn new(chat_id: i64, service: Arc<S>, messenger: Arc<M>) -> Self {
        let stranger = service.get_or_create_stranger(chat_id);
        Self { chat_id, service, messenger, stranger }
    }

    /// Handle one inbound event. All recoverable failures are dealt with
    /// here; the event loop never sees them.
    pub async fn on_message(&self, event: &Event) {
        let (kind, scope, chat_id) = event.classify();
        if scope != ChatScope::Private {
            debug!("Ignoring {kind} event in non-private chat {chat_id}");
            return;
        }

        let content = match extract_content(event, kind) {
            Ok(content) => content,
            Err(UnsupportedContent) => {
                debug!("Unsupported {kind} event in chat {chat_id}");
                self.send_notification(UNSUPPORTED_NOTICE).await;
                return;
            }
        };

        // Commands are never forwarded as chat content.
        if let Content::Text { text } = &content {
            if let Some(command) = Command::parse(text) {
                self.handle_command(command).await;
                return;
            }
        }

        if let Err(MissingPartner) = self.stranger.send_to_partner(&content).await {
            // No notice to the sender on this path.
            debug!("Chat {chat_id} has no partner, {kind} message dropped");
        }
    }

    async fn handle_command(&self, command: Command) {
        debug!("Command {command:?} in chat {}", self.chat_id);
        match command {
            Command::Begin => {
                if let Err(NoPartnerAvailable) = self.service.set_partner(&self.stranger).await {
                    debug!("No partner available for chat {} yet", self.chat_id);
                }
            }
            Command::End => self.stranger.end_chatting().await,
            Command::Help | Command::Start => {
                self.send_notification(&help_text(self.chat_id)).await;
            }
        }
    }

    /// Send a bot notice to this chat.
    pub async fn send_notification(&self, text: &str) {
        notify(self.messenger.as_ref(), self.chat_id, text).await;
    }

    /// Transmit content into this chat on behalf of a partner.
    pub async fn send(&self, content: &Content) -> Result<(), UnsupportedContent> {
        relay_content(self.messenger.as_ref(), self.chat_id, content).await
    }
}

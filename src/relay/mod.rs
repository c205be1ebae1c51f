//! Stranger matching and message relay between paired private chats.

pub mod command;
pub mod content;
pub mod event;
pub mod pairing;
pub mod router;
pub mod telegram;


pub use content::{Content, ContentKind};
pub use event::{Chat, ChatScope, Event, PhotoSize};
pub use pairing::{MatchMaker, MatchService, Session};
pub use router::Router;
pub use telegram::{Messenger, TelegramClient};

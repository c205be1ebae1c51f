//! Content payloads relayed between matched strangers.

use std::fmt;

use crate::relay::event::Event;

/// Declared content kind of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Photo,
    Video,
    Document,
    Sticker,
    Voice,
    Audio,
    VideoNote,
    Location,
    Contact,
    Unknown,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Text => "text",
            ContentKind::Photo => "photo",
            ContentKind::Video => "video",
            ContentKind::Document => "document",
            ContentKind::Sticker => "sticker",
            ContentKind::Voice => "voice",
            ContentKind::Audio => "audio",
            ContentKind::VideoNote => "video_note",
            ContentKind::Location => "location",
            ContentKind::Contact => "contact",
            ContentKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// A payload the bot knows how to re-send to a partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text { text: String },
    Photo { file_id: String, caption: Option<String> },
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Text { .. } => ContentKind::Text,
            Content::Photo { .. } => ContentKind::Photo,
        }
    }
}

/// The event's shape can't be turned into a relayable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedContent;

impl fmt::Display for UnsupportedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported message content")
    }
}

impl std::error::Error for UnsupportedContent {}

/// Validate an event against its declared kind and pull out the payload.
///
/// Replies are rejected regardless of what they point at. Photo events keep
/// only the last size variant, the largest one Telegram offers.
pub fn extract_content(event: &Event, kind: ContentKind) -> Result<Content, UnsupportedContent> {
    match kind {
        ContentKind::Text => {
            if event.has_reply() {
                return Err(UnsupportedContent);
            }
            match &event.text {
                Some(text) if !text.is_empty() => Ok(Content::Text { text: text.clone() }),
                _ => Err(UnsupportedContent),
            }
        }
        ContentKind::Photo => {
            if event.has_reply() {
                return Err(UnsupportedContent);
            }
            let sizes = event.photo.as_deref().ok_or(UnsupportedContent)?;
            let largest = sizes.last().ok_or(UnsupportedContent)?;
            Ok(Content::Photo {
                file_id: largest.file_id.clone(),
                caption: event.caption.clone(),
            })
        }
        _ => Err(UnsupportedContent),
    }
}

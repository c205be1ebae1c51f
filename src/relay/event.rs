//! Normalized inbound events.
//!
//! Telegram updates are flattened into `Event` before routing, so the rest
//! of the relay never touches platform types. The shape mirrors Telegram's
//! message JSON and deserializes straight from it.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::relay::content::ContentKind;

/// The kind of chat an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatScope {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// The chat an event belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub scope: ChatScope,
}

/// One photo size variant. Telegram lists sizes in ascending resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

/// A normalized inbound message event.
///
/// `reply_to_message` keeps key-presence semantics: `None` means the key was
/// absent, `Some(_)` that it was present, even as JSON null. Replies are
/// rejected at content extraction either way.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "key_presence")]
    pub reply_to_message: Option<Option<Value>>,
    #[serde(default)]
    pub video: Option<Value>,
    #[serde(default)]
    pub document: Option<Value>,
    #[serde(default)]
    pub sticker: Option<Value>,
    #[serde(default)]
    pub voice: Option<Value>,
    #[serde(default)]
    pub audio: Option<Value>,
    #[serde(default)]
    pub video_note: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub contact: Option<Value>,
}

/// Distinguishes an absent key from a key that is present but null.
fn key_presence<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

impl Event {
    /// Classify the event: declared content kind, chat scope and chat id.
    pub fn classify(&self) -> (ContentKind, ChatScope, i64) {
        let kind = if self.text.is_some() {
            ContentKind::Text
        } else if self.photo.is_some() {
            ContentKind::Photo
        } else if self.video.is_some() {
            ContentKind::Video
        } else if self.document.is_some() {
            ContentKind::Document
        } else if self.sticker.is_some() {
            ContentKind::Sticker
        } else if self.voice.is_some() {
            ContentKind::Voice
        } else if self.audio.is_some() {
            ContentKind::Audio
        } else if self.video_note.is_some() {
            ContentKind::VideoNote
        } else if self.location.is_some() {
            ContentKind::Location
        } else if self.contact.is_some() {
            ContentKind::Contact
        } else {
            ContentKind::Unknown
        };
        (kind, self.chat.scope, self.chat.id)
    }

    /// True if the `reply_to_message` key was present at all.
    pub fn has_reply(&self) -> bool {
        self.reply_to_message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(fields: Value) -> Event {
        serde_json::from_value(fields).unwrap()
    }

    #[test]
    fn test_classify_text() {
        let event = event(json!({
            "chat": {"id": 31416, "type": "private"},
            "text": "hello"
        }));
        assert_eq!(event.classify(), (ContentKind::Text, ChatScope::Private, 31416));
    }

    #[test]
    fn test_classify_photo() {
        let event = event(json!({
            "chat": {"id": 31416, "type": "private"},
            "photo": [{"file_id": "foo"}]
        }));
        assert_eq!(event.classify(), (ContentKind::Photo, ChatScope::Private, 31416));
    }

    #[test]
    fn test_classify_video_in_group() {
        let event = event(json!({
            "chat": {"id": -100, "type": "supergroup"},
            "video": {"file_id": "v", "duration": 3}
        }));
        assert_eq!(event.classify(), (ContentKind::Video, ChatScope::Supergroup, -100));
    }

    #[test]
    fn test_classify_empty_event() {
        let event = event(json!({"chat": {"id": 1, "type": "private"}}));
        assert_eq!(event.classify().0, ContentKind::Unknown);
    }

    #[test]
    fn test_reply_key_presence() {
        let absent = event(json!({
            "chat": {"id": 1, "type": "private"},
            "text": "foo"
        }));
        assert!(!absent.has_reply());

        let null = event(json!({
            "chat": {"id": 1, "type": "private"},
            "text": "foo",
            "reply_to_message": null
        }));
        assert!(null.has_reply());

        let full = event(json!({
            "chat": {"id": 1, "type": "private"},
            "text": "foo",
            "reply_to_message": {"message_id": 9}
        }));
        assert!(full.has_reply());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotIdentity {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub chat_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// One element of a message body. Only `file` parts matter to the bot, the
/// rest (mentions, replies, stickers) are carried through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Part {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Part {
    pub fn file_id(&self) -> Option<&str> {
        if self.kind != "file" {
            return None;
        }
        self.payload.get("fileId").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub msg_id: String,
    pub chat: Chat,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Message {
    pub fn file_id(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::file_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    #[serde(default)]
    pub query_id: String,
    #[serde(default)]
    pub callback_data: String,
    pub message: CallbackOrigin,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackOrigin {
    pub chat: Chat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    NewMessage(Message),
    CallbackQuery(CallbackQuery),
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotEvent {
    pub event_id: u64,
    pub kind: EventKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    event_id: u64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl BotEvent {
    /// Decodes one entry of the `events` array. Payloads that do not match
    /// their declared type are reported as `Other` rather than failing the
    /// whole batch.
    pub fn from_value(value: Value) -> Option<Self> {
        let raw: RawEvent = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping malformed event: {}", e);
                return None;
            }
        };

        let kind = match raw.kind.as_str() {
            "newMessage" => serde_json::from_value(raw.payload)
                .map(EventKind::NewMessage)
                .unwrap_or_else(|e| {
                    tracing::warn!("Unreadable newMessage payload: {}", e);
                    EventKind::Other(raw.kind.clone())
                }),
            "callbackQuery" => serde_json::from_value(raw.payload)
                .map(EventKind::CallbackQuery)
                .unwrap_or_else(|e| {
                    tracing::warn!("Unreadable callbackQuery payload: {}", e);
                    EventKind::Other(raw.kind.clone())
                }),
            _ => EventKind::Other(raw.kind.clone()),
        };

        Some(Self {
            event_id: raw.event_id,
            kind,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Attention,
    Base,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub text: String,
    pub callback_data: String,
    pub style: ButtonStyle,
}

impl Button {
    pub fn new(text: &str, callback_data: &str, style: ButtonStyle) -> Self {
        Self {
            text: text.to_string(),
            callback_data: callback_data.to_string(),
            style,
        }
    }
}

/// Rows of inline buttons attached to a message.
pub type Keyboard = Vec<Vec<Button>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_message_with_file_part() {
        let event = BotEvent::from_value(json!({
            "eventId": 12,
            "type": "newMessage",
            "payload": {
                "msgId": "700",
                "chat": {"chatId": "hr@corp", "type": "private"},
                "from": {"userId": "hr@corp"},
                "text": "",
                "parts": [
                    {"type": "mention", "payload": {"userId": "x"}},
                    {"type": "file", "payload": {"fileId": "F1", "type": "file"}}
                ]
            }
        }))
        .unwrap();

        assert_eq!(event.event_id, 12);
        match event.kind {
            EventKind::NewMessage(msg) => {
                assert_eq!(msg.chat.chat_id, "hr@corp");
                assert_eq!(msg.file_id(), Some("F1"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_callback_query() {
        let event = BotEvent::from_value(json!({
            "eventId": 13,
            "type": "callbackQuery",
            "payload": {
                "queryId": "Q1",
                "callbackData": "cmd_status",
                "from": {"userId": "hr@corp"},
                "message": {"msgId": "701", "chat": {"chatId": "group@chat", "type": "group"}}
            }
        }))
        .unwrap();

        match event.kind {
            EventKind::CallbackQuery(q) => {
                assert_eq!(q.query_id, "Q1");
                assert_eq!(q.callback_data, "cmd_status");
                assert_eq!(q.message.chat.chat_id, "group@chat");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_and_malformed_events() {
        let other = BotEvent::from_value(json!({
            "eventId": 14, "type": "editedMessage", "payload": {}
        }))
        .unwrap();
        assert_eq!(other.kind, EventKind::Other("editedMessage".to_string()));

        let broken = BotEvent::from_value(json!({
            "eventId": 15, "type": "newMessage", "payload": {"text": "no chat"}
        }))
        .unwrap();
        assert_eq!(broken.kind, EventKind::Other("newMessage".to_string()));

        assert!(BotEvent::from_value(json!({"type": "newMessage"})).is_none());
    }

    #[test]
    fn test_keyboard_serialization() {
        let keyboard: Keyboard = vec![vec![Button::new("Status", "cmd_status", ButtonStyle::Primary)]];
        let value = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(
            value,
            json!([[{"text": "Status", "callbackData": "cmd_status", "style": "primary"}]])
        );
    }
}

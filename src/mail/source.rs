use serde::Deserialize;

use crate::domain::email::CandidateRef;
use crate::error::Result;

/// A mailbox the sync driver reads from.
pub trait MessageSource {
    /// Ids of the unread messages in the inbox, in no particular order.
    fn list_unread(&self) -> Result<Vec<CandidateRef>>;

    /// Full message. `SyncError::NotFound` if it no longer exists.
    fn fetch(&self, candidate: &CandidateRef) -> Result<RawMessage>;

    /// Idempotent: marking a read message again is not an error.
    fn mark_read(&self, candidate: &CandidateRef) -> Result<()>;
}

/// Message as delivered by the source: headers plus a tree of body parts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    /// Milliseconds since epoch, as a decimal string.
    #[serde(default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub payload: MessagePart,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    /// base64url-encoded content
    #[serde(default)]
    pub data: Option<String>,
}

impl MessagePart {
    /// First header called `name`, compared ASCII case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_format_message() {
        let json = r#"{
            "id": "18c2f0a",
            "threadId": "18c2f0a",
            "labelIds": ["UNREAD", "INBOX"],
            "internalDate": "1772532000000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "Acme <billing@acme.test>"},
                    {"name": "Subject", "value": "Invoice 42"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"mimeType": "text/plain", "headers": [], "body": {"size": 5, "data": "aGVsbG8="}}
                ]
            }
        }"#;
        let msg: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "18c2f0a");
        assert_eq!(msg.internal_date.as_deref(), Some("1772532000000"));
        assert!(msg.payload.is_multipart());
        assert_eq!(msg.payload.header("Subject"), Some("Invoice 42"));
        assert_eq!(msg.payload.header("Date"), None);
        assert_eq!(msg.payload.parts[0].body.data.as_deref(), Some("aGVsbG8="));
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let part = MessagePart {
            headers: vec![
                Header {
                    name: "FROM".into(),
                    value: "billing@acme.test".into(),
                },
                Header {
                    name: "subject".into(),
                    value: "Invoice 7".into(),
                },
                Header {
                    name: "Subject".into(),
                    value: "second".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(part.header("From"), Some("billing@acme.test"));
        assert_eq!(part.header("Subject"), Some("Invoice 7"));
        assert_eq!(part.header("Date"), None);
    }
}

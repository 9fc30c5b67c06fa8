//! Turns a fetched message into an [`EmailRecord`].

use crate::domain::email::{EmailRecord, MAX_BODY_CHARS};
use crate::mail::decoders::{decode_body_data, extract_address, html_to_text, truncate_chars};
use crate::mail::source::{MessagePart, RawMessage};

pub fn parse(raw: &RawMessage) -> EmailRecord {
    let payload = &raw.payload;

    let sender = payload.header("From").map(extract_address).unwrap_or_default();
    let subject = payload.header("Subject").unwrap_or_default().to_string();
    let date = payload.header("Date").unwrap_or_default().to_string();

    let decoded = extract_body(payload).unwrap_or_default();
    let body = truncate_chars(&html_to_text(&decoded), MAX_BODY_CHARS);

    let timestamp = raw
        .internal_date
        .as_deref()
        .and_then(|d| d.trim().parse::<u64>().ok())
        .unwrap_or(0);

    EmailRecord {
        sender,
        subject,
        date,
        body,
        timestamp,
    }
}

/// Multipart: first text/plain part, depth-first. Single part: the sole body.
fn extract_body(payload: &MessagePart) -> Option<String> {
    if payload.is_multipart() {
        return find_plain_text(&payload.parts);
    }
    payload.body.data.as_deref().and_then(decode_body_data)
}

fn find_plain_text(parts: &[MessagePart]) -> Option<String> {
    for part in parts {
        if part.mime_type.eq_ignore_ascii_case("text/plain")
            && let Some(text) = part.body.data.as_deref().and_then(decode_body_data)
        {
            return Some(text);
        }
        if let Some(text) = find_plain_text(&part.parts) {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::source::{Header, PartBody};
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE;

    fn encode(s: &str) -> Option<String> {
        Some(URL_SAFE.encode(s))
    }

    fn headers(pairs: &[(&str, &str)]) -> Vec<Header> {
        pairs
            .iter()
            .map(|(n, v)| Header {
                name: n.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    fn part(mime: &str, data: Option<String>) -> MessagePart {
        MessagePart {
            mime_type: mime.to_string(),
            body: PartBody { data },
            ..Default::default()
        }
    }

    fn message(payload: MessagePart, internal_date: &str) -> RawMessage {
        RawMessage {
            id: "m1".into(),
            internal_date: Some(internal_date.into()),
            payload,
        }
    }

    #[test]
    fn test_parse_single_part() {
        let mut payload = part("text/plain", encode("Amount due: 120 EUR"));
        payload.headers = headers(&[
            ("From", "Jane Doe <jane@x.com>"),
            ("Subject", "Invoice #4"),
            ("Date", "Mon, 2 Mar 2026 09:15:00 +0100"),
        ]);
        let record = parse(&message(payload, "1772439300000"));

        assert_eq!(record.sender, "jane@x.com");
        assert_eq!(record.subject, "Invoice #4");
        assert_eq!(record.date, "Mon, 2 Mar 2026 09:15:00 +0100");
        assert_eq!(record.body, "Amount due: 120 EUR");
        assert_eq!(record.timestamp, 1_772_439_300_000);
    }

    #[test]
    fn test_missing_headers_are_empty() {
        let record = parse(&message(part("text/plain", None), "5"));
        assert_eq!(record.sender, "");
        assert_eq!(record.subject, "");
        assert_eq!(record.date, "");
        assert_eq!(record.body, "");
        assert_eq!(record.timestamp, 5);
    }

    #[test]
    fn test_multipart_takes_first_plain_part() {
        let payload = MessagePart {
            mime_type: "multipart/alternative".into(),
            parts: vec![
                part("text/html", encode("<p>html version</p>")),
                part("text/plain", encode("first plain")),
                part("text/plain", encode("second plain")),
            ],
            ..Default::default()
        };
        assert_eq!(parse(&message(payload, "1")).body, "first plain");
    }

    #[test]
    fn test_multipart_nested_plain_part() {
        let alternative = MessagePart {
            mime_type: "multipart/alternative".into(),
            parts: vec![part("text/plain", encode("nested body"))],
            ..Default::default()
        };
        let payload = MessagePart {
            mime_type: "multipart/mixed".into(),
            parts: vec![alternative, part("application/pdf", encode("%PDF"))],
            ..Default::default()
        };
        assert_eq!(parse(&message(payload, "1")).body, "nested body");
    }

    #[test]
    fn test_multipart_without_plain_part_has_empty_body() {
        let payload = MessagePart {
            mime_type: "multipart/alternative".into(),
            parts: vec![part("text/html", encode("<p>only html</p>"))],
            ..Default::default()
        };
        assert_eq!(parse(&message(payload, "1")).body, "");
    }

    #[test]
    fn test_single_part_html_is_converted() {
        let payload = part(
            "text/html",
            encode("<html><body><div>Invoice</div>\n<p>Total:  99</p></body></html>"),
        );
        assert_eq!(parse(&message(payload, "1")).body, "Invoice Total: 99");

        let payload = part(
            "text/html",
            encode("<h1>Invoice 7</h1><ul><li><b>Total</b>: 99</li></ul><a href=\"https://pay.example\">Pay</a>"),
        );
        assert_eq!(parse(&message(payload, "1")).body, "Invoice 7 Total: 99 Pay");
    }

    #[test]
    fn test_body_truncated_to_limit() {
        let long = "a".repeat(40_000);
        let record = parse(&message(part("text/plain", encode(&long)), "1"));
        assert_eq!(record.body.chars().count(), MAX_BODY_CHARS);
        assert_eq!(record.body, &long[..MAX_BODY_CHARS]);
    }

    #[test]
    fn test_unparseable_internal_date_is_zero() {
        assert_eq!(parse(&message(part("text/plain", None), "yesterday")).timestamp, 0);
        let no_date = RawMessage {
            id: "m2".into(),
            ..Default::default()
        };
        assert_eq!(parse(&no_date).timestamp, 0);
    }
}

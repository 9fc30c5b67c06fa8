use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use html2text::render::TrivialDecorator;

// Gmail body data is base64url; padding is present on some parts and not others.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const MIN_RENDER_WIDTH: usize = 80;

/// Decode a base64url body payload. `None` when the data is not valid base64.
pub fn decode_body_data(data: &str) -> Option<String> {
    let bytes = BASE64_URL.decode(data.trim()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Address portion of a `From` header value, display name dropped.
pub fn extract_address(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    if let Ok(list) = mailparse::addrparse(raw) {
        for addr in list.iter() {
            match addr {
                mailparse::MailAddr::Single(info) => return info.addr.clone(),
                mailparse::MailAddr::Group(group) => {
                    if let Some(info) = group.addrs.first() {
                        return info.addr.clone();
                    }
                }
            }
        }
    }

    // addrparse rejects some real-world headers; fall back to the angle brackets
    match (raw.rfind('<'), raw.rfind('>')) {
        (Some(start), Some(end)) if start < end => raw[start + 1..end].trim().to_string(),
        _ => raw.to_string(),
    }
}

/// Render HTML (or plain text) as a single line holding only its text nodes,
/// in document order. No link, emphasis, heading or list markers are emitted.
pub fn html_to_text(input: &str) -> String {
    // No word is wider than the whole input, so html2text never splits one.
    let width = input.chars().count().max(MIN_RENDER_WIDTH);
    // raw mode walks table cells in document order without borders
    let rendered = html2text::config::with_decorator(TrivialDecorator::new())
        .raw_mode(true)
        .string_from_read(input.as_bytes(), width)
        .unwrap_or_else(|_| strip_tags(input));
    collapse_whitespace(&rendered)
}

pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_address_with_display_name() {
        assert_eq!(extract_address("Jane Doe <jane@x.com>"), "jane@x.com");
        assert_eq!(
            extract_address("\"Doe, Jane\" <jane@x.com>"),
            "jane@x.com"
        );
    }

    #[test]
    fn test_extract_address_bare() {
        assert_eq!(extract_address("jane@x.com"), "jane@x.com");
        assert_eq!(extract_address("  jane@x.com  "), "jane@x.com");
        assert_eq!(extract_address(""), "");
    }

    #[test]
    fn test_decode_body_data_padding_variants() {
        // "Invoice attached" in base64url, with and without padding
        assert_eq!(
            decode_body_data("SW52b2ljZSBhdHRhY2hlZA==").as_deref(),
            Some("Invoice attached")
        );
        assert_eq!(
            decode_body_data("SW52b2ljZSBhdHRhY2hlZA").as_deref(),
            Some("Invoice attached")
        );
        assert_eq!(decode_body_data("not base64 !!"), None);
    }

    #[test]
    fn test_html_to_text_strips_and_collapses() {
        let html = "<html><body>\n  <p>Invoice   42</p>\n<div>Total:\n 10 EUR</div></body></html>";
        assert_eq!(html_to_text(html), "Invoice 42 Total: 10 EUR");
    }

    #[test]
    fn test_html_to_text_drops_inline_markup() {
        assert_eq!(
            html_to_text("<p>Pay <a href=\"https://pay.example/x\">here</a> now</p>"),
            "Pay here now"
        );
        assert_eq!(
            html_to_text("<p>Total: <b>42</b> <em>EUR</em></p>"),
            "Total: 42 EUR"
        );
        assert_eq!(
            html_to_text("<p><strong>Due</strong> <i>soon</i><br>Thanks</p>"),
            "Due soon Thanks"
        );
    }

    #[test]
    fn test_html_to_text_drops_heading_and_list_prefixes() {
        assert_eq!(
            html_to_text("<h1>Invoice</h1><ul><li>one</li><li>two</li></ul>"),
            "Invoice one two"
        );
        assert_eq!(
            html_to_text("<h2>Items</h2><ol><li>first</li><li>second</li></ol>"),
            "Items first second"
        );
    }

    #[test]
    fn test_html_to_text_table_cells_in_order() {
        let html = "<table><tr><td>Total</td><td>42 EUR</td></tr><tr><td>Due</td><td>May 1</td></tr></table>";
        assert_eq!(html_to_text(html), "Total 42 EUR Due May 1");
    }

    #[test]
    fn test_html_to_text_plain_input_only_collapses() {
        assert_eq!(
            html_to_text("  Hello there,\n\nyour invoice is ready.\n"),
            "Hello there, your invoice is ready."
        );
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn test_strip_tags_fallback() {
        assert_eq!(collapse_whitespace(&strip_tags("<p>a</p><p>b</p>")), "a b");
    }

    #[test]
    fn test_truncate_chars_counts_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}

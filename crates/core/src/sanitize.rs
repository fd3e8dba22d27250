//! Report sanitization for chat-channel delivery.
//!
//! Channel endpoints reject messages with stray markup or control
//! characters. The pipeline here mirrors what the channel accepts: decode
//! entities, drop tag-like substrings, re-escape the three
//! HTML-significant characters, and remove non-printable characters.

use regex::Regex;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"))
}

fn entity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(?:#[xX]?[0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").expect("valid entity pattern")
    })
}

fn control_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\u{9F}]").expect("valid control pattern")
    })
}

/// Prepares report text for channel delivery.
///
/// Decodes HTML entities, strips tag-like substrings, re-escapes `&`,
/// `<`, `>`, and removes control characters outside the printable and
/// whitespace range.
#[must_use]
pub fn sanitize_for_channel(text: &str) -> String {
    let decoded = decode_entities(text);
    let untagged = tag_pattern().replace_all(&decoded, "");

    let escaped = untagged
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    control_pattern().replace_all(&escaped, "").into_owned()
}

/// Decodes numeric character references and the named entities the
/// listing feeds actually emit.
fn decode_entities(text: &str) -> String {
    entity_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[0];
            decode_entity(entity).unwrap_or_else(|| entity.to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let body = &entity[1..entity.len() - 1];

    if let Some(numeric) = body.strip_prefix('#') {
        let code = if let Some(hex) = numeric.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            numeric.parse::<u32>().ok()?
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "laquo" => '\u{AB}',
        "raquo" => '\u{BB}',
        _ => return None,
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Entity Decoding Tests ====================

    #[test]
    fn test_named_entities_decoded() {
        assert_eq!(decode_entities("&quot;studio&quot;"), "\"studio\"");
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("x&nbsp;y"), "x y");
    }

    #[test]
    fn test_numeric_entities_decoded() {
        assert_eq!(decode_entities("&#39;flat&#39;"), "'flat'");
        assert_eq!(decode_entities("&#x41;"), "A");
    }

    #[test]
    fn test_unknown_entity_left_as_is() {
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    // ==================== Sanitization Tests ====================

    #[test]
    fn test_tags_stripped() {
        assert_eq!(
            sanitize_for_channel("<b>Marina View</b> tower"),
            "Marina View tower"
        );
    }

    #[test]
    fn test_significant_characters_reescaped() {
        assert_eq!(sanitize_for_channel("Beds & Baths"), "Beds &amp; Baths");
        // Decoded entities are escaped back, so raw angle brackets never
        // reach the channel
        assert_eq!(sanitize_for_channel("a &lt; b"), "a &lt; b");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(sanitize_for_channel("ok\u{0}\u{7}\u{1B}done"), "okdone");
        assert_eq!(sanitize_for_channel("high\u{9F}bit"), "highbit");
    }

    #[test]
    fn test_whitespace_preserved() {
        assert_eq!(sanitize_for_channel("line one\nline two\ttabbed"), "line one\nline two\ttabbed");
    }

    #[test]
    fn test_plain_report_text_unchanged() {
        let text = "Location: Marina\n1. Nice studio\n   Change: \u{1F4C8} +4.17%";
        assert_eq!(sanitize_for_channel(text), text);
    }
}

//! Text cleanup applied to WordPress fields.
//!
//! `sanitize_html` is a minimal filter: it removes `<script>` blocks and inline
//! `on*=` handler attributes and nothing else. It is not an HTML sanitizer and
//! must not be relied on for untrusted markup beyond that.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex"));

static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?script\b[^>]*>").expect("static regex"));

static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>"']+)"#).expect("static regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("static regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Strip script blocks and inline event handlers from rich text.
pub fn sanitize_html(html: &str) -> String {
    let without_blocks = SCRIPT_BLOCK.replace_all(html, "");
    let without_tags = SCRIPT_TAG.replace_all(&without_blocks, "");
    EVENT_HANDLER.replace_all(&without_tags, "").into_owned()
}

/// Decode named, decimal and hex character references in one pass.
///
/// Unknown names and invalid code points are left untouched. `&nbsp;` becomes
/// a plain space.
pub fn decode_html_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            decode_entity(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "ldquo" => "“",
        "rdquo" => "”",
        "lsquo" => "‘",
        "rsquo" => "’",
        "laquo" => "«",
        "raquo" => "»",
        "middot" => "·",
        "bull" => "•",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Remove tags, decode entities, and collapse whitespace for plain-text display.
pub fn clean_html_for_display(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    let decoded = decode_html_entities(&without_tags);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Plain-text excerpt of at most `length` characters, `...` appended when cut.
pub fn generate_excerpt(html: &str, length: usize) -> String {
    let text = clean_html_for_display(html);
    if text.chars().count() <= length {
        return text;
    }
    let cut: String = text.chars().take(length).collect();
    format!("{}...", cut.trim_end())
}

//! Rich-text handling for user supplied content.

use regex::Regex;

pub const EXCERPT_LEN: usize = 150;

lazy_static::lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref SPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Sanitize HTML content using ammonia
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Plain-text prefix of (already sanitized) HTML, used when a post is
/// created without an explicit excerpt. Entities are decoded before the cut.
pub fn excerpt_from(html: &str) -> String {
    let text = TAG_REGEX.replace_all(html, " ");
    let text = unescape_text(&text);
    let text = SPACE_REGEX.replace_all(text.trim(), " ");
    text.chars().take(EXCERPT_LEN).collect()
}

/// Reverses the escaping the sanitizer applies to text nodes. `&amp;` goes
/// last so `&amp;lt;` stays the literal `&lt;`.
fn unescape_text(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

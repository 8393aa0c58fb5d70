// ABOUTME: Extracts the link from shared text.
// ABOUTME: Share sheets often wrap the URL in prose; the first http(s) URL wins.

use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"']+"#).expect("URL pattern is valid")
});

/// Normalize shared text into a link payload.
///
/// Returns the first `http(s)` URL in `text` with trailing punctuation
/// stripped, the trimmed text when no URL is present, or `None` for blank input.
pub fn extract_link(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match URL_PATTERN.find(trimmed) {
        Some(m) => {
            let url = m
                .as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']']);
            Some(url.to_string())
        }
        None => Some(trimmed.to_string()),
    }
}

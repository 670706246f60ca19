use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static SOFT_HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-[ \t]*\r?\n[ \t]*(\w)").expect("valid regex"));

static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));

/// Cleans text pulled out of a page layout: NFKC normalization, words rejoined
/// across hyphenated line breaks, runs of spaces collapsed, and blank-line runs
/// reduced to a single paragraph break.
pub fn sanitize_extracted_text(raw: &str) -> String {
    let normalized: String = raw.nfkc().collect();
    let joined = SOFT_HYPHEN_BREAK.replace_all(&normalized, "$1$2");

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in joined.lines() {
        let line = INLINE_WHITESPACE.replace_all(line.trim(), " ");
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.into_owned());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}

use std::sync::OnceLock;

use regex::Regex;

use super::stopwords::is_stopword;

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"http\S+").expect("static url pattern"))
}

fn non_letter_pattern() -> &'static Regex {
    static NON_LETTER: OnceLock<Regex> = OnceLock::new();
    NON_LETTER.get_or_init(|| Regex::new(r"[^A-Za-z\s]").expect("static letter pattern"))
}

/// Normalizes one tweet into lowercase, stopword-free ASCII words.
///
/// URLs are removed before and after the letter filter: punctuation removal and
/// lowercasing can assemble a new `http...` token (`"HT!TPS"`), and stripping it
/// again keeps `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(text: &str) -> String {
    let without_urls = url_pattern().replace_all(text, "");
    let letters_only = non_letter_pattern().replace_all(&without_urls, "");
    let lowered = letters_only.to_lowercase();
    let lowered = url_pattern().replace_all(&lowered, "");

    lowered
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Missing cells clean to the empty string.
pub fn clean_optional_text(text: Option<&str>) -> String {
    text.map(clean_text).unwrap_or_default()
}

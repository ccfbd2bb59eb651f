//! Text normalization shared by indexing and matching.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z][a-z0-9+.\-]*://)?(?:www\.)?([^/:?#\s@]+)")
        .expect("host pattern is valid")
});

/// Lowercased form with runs of whitespace collapsed to one space, used for
/// every comparison.
pub(crate) fn normalize(text: &str) -> String {
    text.split_whitespace().join(" ").to_lowercase()
}

/// Bare host of a website URL: no scheme, `www.`, port, path, query or fragment.
pub(crate) fn website_host(url: &str) -> Option<String> {
    let url = normalize(url);
    HOST_RE
        .captures(&url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_owned())
        .filter(|host| !host.is_empty())
}

/// Splits a name into lowercase words. Punctuation inside a word is dropped
/// ("St. Mary's" gives `["st", "marys"]`) while separators start a new word.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || matches!(c, '-' | '/' | '&' | ',' | '+'))
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Labels of a host that carry meaning, without the top-level domain.
pub(crate) fn host_words(host: &str) -> Vec<String> {
    let mut labels: Vec<&str> = host.split('.').collect();
    if labels.len() > 1 {
        labels.pop();
    }
    labels
        .into_iter()
        .flat_map(|label| label.split('-'))
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

/// First letter of every word, in order.
pub(crate) fn initials(words: &[String]) -> String {
    words.iter().filter_map(|word| word.chars().next()).collect()
}

//! Substring and acronym matching, with the directory's tie-break order.

use std::cmp::Ordering;

use super::{engine::Query, index::IndexedItem};

/// Why an entry matched, reduced to what the tie-break needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExactRank {
    listed: bool,
    name_prefix: bool,
    slug_prefix: bool,
    host_prefix: bool,
}

/// Returns the entry's rank if the query matches it exactly.
///
/// A match is the whole query as a substring of the name, slug or website
/// host, or an acronym match against the name.
pub(crate) fn exact_match(entry: &IndexedItem, query: &Query) -> Option<ExactRank> {
    let text = query.text.as_str();
    let slug = entry.slug.as_deref();
    let host = entry.host.as_deref();

    let substring = entry.name.contains(text)
        || slug.is_some_and(|s| s.contains(text))
        || host.is_some_and(|h| h.contains(text));

    if !substring && !acronym_match(&query.words, entry) {
        return None;
    }

    Some(ExactRank {
        listed: entry.item.is_listed(),
        name_prefix: entry.name.starts_with(text),
        slug_prefix: slug.is_some_and(|s| s.starts_with(text)),
        host_prefix: host.is_some_and(|h| h.starts_with(text)),
    })
}

/// Some query word of two or more letters spells the initials of a run of
/// consecutive name words, and every other query word appears in the name.
///
/// A run of consecutive words has consecutive initials, so the run test is a
/// substring test against the name's initials.
pub(crate) fn acronym_match(query_words: &[String], entry: &IndexedItem) -> bool {
    query_words.iter().enumerate().any(|(i, word)| {
        word.chars().count() >= 2
            && entry.initials.contains(word.as_str())
            && query_words
                .iter()
                .enumerate()
                .all(|(j, other)| j == i || entry.name.contains(other.as_str()))
    })
}

/// Listed first, then name, slug and host prefix matches, then alphabetical.
pub(crate) fn compare(
    a: &IndexedItem,
    a_rank: &ExactRank,
    b: &IndexedItem,
    b_rank: &ExactRank,
) -> Ordering {
    b_rank
        .listed
        .cmp(&a_rank.listed)
        .then_with(|| b_rank.name_prefix.cmp(&a_rank.name_prefix))
        .then_with(|| b_rank.slug_prefix.cmp(&a_rank.slug_prefix))
        .then_with(|| b_rank.host_prefix.cmp(&a_rank.host_prefix))
        .then_with(|| a.name.cmp(&b.name))
}

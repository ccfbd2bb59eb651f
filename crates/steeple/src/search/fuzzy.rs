//! Edit-distance and word-overlap scoring for the fuzzy pass.

use rapidfuzz::distance::levenshtein;

use super::{engine::Query, index::IndexedItem};

/// Credit for a query word that spells the initials of a run of name words.
const ACRONYM_WEIGHT: f64 = 0.9;
/// Credit for a query word contained in (or containing) a name or host word.
const SUBSTRING_WEIGHT: f64 = 0.75;
/// Per-word edit similarity below this earns nothing.
const WORD_SIMILARITY_FLOOR: f64 = 0.7;
/// Shortest fragment that counts as a substring overlap.
const MIN_OVERLAP_CHARS: usize = 3;

/// `1 - editDistance / maxLength`, with empty input scoring zero.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    levenshtein::normalized_similarity(a.chars(), b.chars())
}

/// Best of whole-query edit similarity (name, slug, host) and word overlap.
/// Always in `[0, 1]`.
pub(crate) fn fuzzy_score(entry: &IndexedItem, query: &Query) -> f64 {
    let edit = [
        Some(entry.name.as_str()),
        entry.slug.as_deref(),
        entry.host.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(|field| similarity(&query.text, field))
    .fold(0.0, f64::max);

    edit.max(word_overlap(entry, query)).clamp(0.0, 1.0)
}

/// Mean over query words of each word's best credit against the entry.
fn word_overlap(entry: &IndexedItem, query: &Query) -> f64 {
    let words: Vec<&str> = query
        .words
        .iter()
        .map(String::as_str)
        .filter(|w| w.chars().count() >= 2)
        .collect();
    if words.is_empty() {
        return 0.0;
    }

    let total: f64 = words.iter().map(|word| word_credit(word, entry)).sum();
    total / words.len() as f64
}

fn word_credit(word: &str, entry: &IndexedItem) -> f64 {
    let mut best: f64 = if entry.initials.contains(word) {
        ACRONYM_WEIGHT
    } else {
        0.0
    };

    for candidate in entry.words.iter().chain(&entry.host_words) {
        if candidate == word {
            return 1.0;
        }
        if overlaps(word, candidate) {
            best = best.max(SUBSTRING_WEIGHT);
            continue;
        }
        let sim = similarity(word, candidate);
        if sim >= WORD_SIMILARITY_FLOOR {
            best = best.max(sim);
        }
    }
    best
}

fn overlaps(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.chars().count() >= MIN_OVERLAP_CHARS && long.contains(short)
}

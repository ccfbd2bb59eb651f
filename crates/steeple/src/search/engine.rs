//! Two-pass ranking: exact matches first, fuzzy matches fill the remainder.
//!
//! The exact pass is capped per collection so that one large collection cannot
//! crowd out the others. The fuzzy pass only runs when the exact pass leaves
//! free slots and the query is long enough for edit distance to mean
//! something. Restricted listings are filtered out before either pass so they
//! never take up a slot.

use ahash::AHashSet as HashSet;
use itertools::Itertools;
use steeple_data::{EntityKind, SearchableItem, ViewerRole};
use tracing::{debug, instrument};

use super::{
    exact::{self, ExactRank},
    fuzzy,
    index::{IndexedItem, SearchIndex},
    text,
};

/// A normalized query, parsed once per keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Query {
    pub(crate) text: String,
    pub(crate) words: Vec<String>,
}

impl Query {
    pub(crate) fn parse(raw: &str) -> Self {
        let text = text::normalize(raw);
        let words = text.split_whitespace().map(str::to_owned).collect();
        Self { text, words }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One entry of a result list.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub item: SearchableItem,
    /// Produced by the exact pass. Exact results always precede fuzzy ones.
    pub exact_match: bool,
    /// Similarity in `[threshold, 1.0]`, present only for fuzzy results.
    pub score: Option<f64>,
}

impl RankedResult {
    pub fn path(&self) -> String {
        self.item.canonical_path()
    }
}

/// How many results each collection may contribute to the exact pass, and in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLimits {
    pub max_results: usize,
    pub churches: usize,
    pub counties: usize,
    pub affiliations: usize,
}

impl Default for ResultLimits {
    fn default() -> Self {
        Self {
            max_results: 10,
            churches: 5,
            counties: 3,
            affiliations: 2,
        }
    }
}

impl ResultLimits {
    pub fn cap_for(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Church => self.churches,
            EntityKind::County => self.counties,
            EntityKind::Affiliation => self.affiliations,
        }
    }
}

/// Parameters of the fuzzy fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyParams {
    /// Minimum similarity for a fuzzy result to be kept.
    pub threshold: f64,
    /// Queries shorter than this never reach the fuzzy pass.
    pub min_query_chars: usize,
}

impl Default for FuzzyParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_query_chars: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatchParams {
    pub limits: ResultLimits,
    pub fuzzy: FuzzyParams,
}

const KIND_ORDER: [EntityKind; 3] = [
    EntityKind::Church,
    EntityKind::County,
    EntityKind::Affiliation,
];

/// Ranks `query` against the index as seen by `role`.
///
/// Pure and synchronous. A blank query yields no results.
#[instrument(name = "Match query", skip(index, params), level = "debug")]
pub fn match_query(
    query: &str,
    index: &SearchIndex,
    role: ViewerRole,
    params: &MatchParams,
) -> Vec<RankedResult> {
    let query = Query::parse(query);
    if query.text.is_empty() {
        return Vec::new();
    }

    let visible: Vec<&IndexedItem> = index
        .entries()
        .iter()
        .filter(|entry| entry.item.is_visible_to(role))
        .collect();

    let (mut results, taken) = exact_pass(&visible, &query, &params.limits);
    let exact_count = results.len();

    let max = params.limits.max_results;
    if results.len() < max && query.char_len() >= params.fuzzy.min_query_chars {
        let fuzzy = fuzzy_pass(&visible, &query, params.fuzzy.threshold, &taken);
        results.extend(fuzzy.into_iter().take(max - results.len()));
    }

    debug!(
        candidates = visible.len(),
        exact = exact_count,
        fuzzy = results.len() - exact_count,
        "Ranked query"
    );
    results
}

/// Capped exact results, plus the identity of every exact match including
/// those the caps dropped. The fuzzy pass must not see any of them again.
fn exact_pass(
    visible: &[&IndexedItem],
    query: &Query,
    limits: &ResultLimits,
) -> (Vec<RankedResult>, HashSet<(EntityKind, u64)>) {
    let matched: Vec<(&IndexedItem, ExactRank)> = visible
        .iter()
        .filter_map(|entry| exact::exact_match(entry, query).map(|rank| (*entry, rank)))
        .collect();
    let taken = matched
        .iter()
        .map(|(entry, _)| entry.item.identity())
        .collect();

    let results = KIND_ORDER
        .iter()
        .flat_map(|&kind| {
            matched
                .iter()
                .filter(move |(entry, _)| entry.kind() == kind)
                .sorted_by(|(a, a_rank), (b, b_rank)| exact::compare(a, a_rank, b, b_rank))
                .take(limits.cap_for(kind))
        })
        .take(limits.max_results)
        .map(|(entry, _)| RankedResult {
            item: entry.item.clone(),
            exact_match: true,
            score: None,
        })
        .collect();
    (results, taken)
}

fn fuzzy_pass(
    visible: &[&IndexedItem],
    query: &Query,
    threshold: f64,
    taken: &HashSet<(EntityKind, u64)>,
) -> Vec<RankedResult> {
    visible
        .iter()
        .filter(|entry| !taken.contains(&entry.item.identity()))
        .filter_map(|entry| {
            let score = fuzzy::fuzzy_score(entry, query);
            (score >= threshold).then_some((*entry, score))
        })
        .sorted_by(|(a, a_score), (b, b_score)| {
            b_score
                .total_cmp(a_score)
                .then_with(|| b.item.is_listed().cmp(&a.item.is_listed()))
                .then_with(|| a.name.cmp(&b.name))
        })
        .map(|(entry, score)| RankedResult {
            item: entry.item.clone(),
            exact_match: false,
            score: Some(score),
        })
        .collect()
}

//! Matching for the quick search.
//!
//! A linear-scan index over the three collections, an exact pass (substring
//! and acronym) with the directory's tie-break order, and a fuzzy fallback
//! scored by edit distance and word overlap.

mod engine;
mod exact;
mod fuzzy;
mod index;
mod text;

pub use engine::{FuzzyParams, MatchParams, RankedResult, ResultLimits, match_query};
pub use index::SearchIndex;
pub(crate) use text::website_host;

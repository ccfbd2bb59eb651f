//! In-memory linear-scan index over the three collections.
//!
//! Built once per data arrival. Every entry carries the normalized fields the
//! match engine compares against so no keystroke re-lowercases the corpus.

use steeple_data::{Collections, EntityKind, SearchableItem};
use tracing::{debug, info};

use super::text;

#[derive(Debug, Clone)]
pub(crate) struct IndexedItem {
    pub(crate) item: SearchableItem,
    pub(crate) name: String,
    pub(crate) slug: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) words: Vec<String>,
    pub(crate) host_words: Vec<String>,
    pub(crate) initials: String,
}

impl IndexedItem {
    /// `None` for items without a usable name or a page to open; those are
    /// never searchable.
    fn new(item: SearchableItem) -> Option<Self> {
        let name = text::normalize(item.name());
        if name.is_empty() {
            debug!(kind = %item.kind(), id = item.id(), "Skipping item without a name");
            return None;
        }
        if !item.is_routable() {
            debug!(kind = %item.kind(), id = item.id(), "Skipping item without a slug");
            return None;
        }

        let words = text::words(&name);
        let initials = text::initials(&words);
        let slug = item.url_slug().map(text::normalize);
        let host = item.website_url().and_then(text::website_host);
        let host_words = host.as_deref().map(text::host_words).unwrap_or_default();

        Some(Self {
            item,
            name,
            slug,
            host,
            words,
            host_words,
            initials,
        })
    }

    pub(crate) fn kind(&self) -> EntityKind {
        self.item.kind()
    }
}

/// Searchable snapshot of churches, counties and affiliations.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<IndexedItem>,
}

impl SearchIndex {
    pub fn build(collections: &Collections) -> Self {
        let items = collections
            .churches
            .iter()
            .cloned()
            .map(SearchableItem::from)
            .chain(collections.counties.iter().cloned().map(SearchableItem::from))
            .chain(
                collections
                    .affiliations
                    .iter()
                    .cloned()
                    .map(SearchableItem::from),
            );

        let entries: Vec<_> = items.filter_map(IndexedItem::new).collect();
        info!(
            indexed = entries.len(),
            skipped = collections.len() - entries.len(),
            "Built search index"
        );
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &SearchableItem> {
        self.entries.iter().map(|entry| &entry.item)
    }

    pub(crate) fn entries(&self) -> &[IndexedItem] {
        &self.entries
    }
}

//! Entity records served by the directory's read API.
//!
//! Three collections feed the quick search: churches, counties and
//! affiliations. Records arrive as camelCase JSON. Fields the search does not
//! use are ignored, and a missing `name` deserializes to an empty string so a
//! single bad record never poisons a whole collection (blank-named items are
//! dropped when the search index is built).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Publication state of a church listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityStatus {
    /// Publicly listed in the directory.
    Listed,
    #[default]
    Unlisted,
    /// Submitted but not yet reviewed.
    Pending,
    /// Doctrinally flagged. Only privileged viewers may see these.
    Heretical,
    #[serde(other)]
    Unknown,
}

impl VisibilityStatus {
    pub fn is_listed(self) -> bool {
        matches!(self, Self::Listed)
    }

    pub fn is_restricted(self) -> bool {
        matches!(self, Self::Heretical)
    }
}

/// Role of the person viewing the page, supplied by the host page at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    #[default]
    None,
    Contributor,
    Moderator,
    Admin,
}

impl ViewerRole {
    /// Privileged roles may see restricted listings.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    pub fn can_see(self, status: VisibilityStatus) -> bool {
        !status.is_restricted() || self.is_privileged()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Church {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default)]
    pub visibility_status: VisibilityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct County {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Discriminant of a [`SearchableItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Church,
    County,
    Affiliation,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Church => "Church",
            Self::County => "County",
            Self::Affiliation => "Affiliation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Anything the quick search can return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchableItem {
    Church(Church),
    County(County),
    Affiliation(Affiliation),
}

impl SearchableItem {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Church(_) => EntityKind::Church,
            Self::County(_) => EntityKind::County,
            Self::Affiliation(_) => EntityKind::Affiliation,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Self::Church(c) => c.id,
            Self::County(c) => c.id,
            Self::Affiliation(a) => a.id,
        }
    }

    /// `(kind, id)` uniquely identifies an item across all three collections.
    pub fn identity(&self) -> (EntityKind, u64) {
        (self.kind(), self.id())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Church(c) => &c.name,
            Self::County(c) => &c.name,
            Self::Affiliation(a) => &a.name,
        }
    }

    pub fn url_slug(&self) -> Option<&str> {
        match self {
            Self::Church(c) => Some(c.url_slug.as_str()),
            Self::County(c) => Some(c.url_slug.as_str()),
            Self::Affiliation(a) => a.url_slug.as_deref(),
        }
        .filter(|slug| !slug.is_empty())
    }

    pub fn website_url(&self) -> Option<&str> {
        match self {
            Self::Church(c) => c.website_url.as_deref(),
            _ => None,
        }
    }

    /// Counties and affiliations carry no visibility state and are always shown.
    pub fn visibility_status(&self) -> Option<VisibilityStatus> {
        match self {
            Self::Church(c) => Some(c.visibility_status),
            _ => None,
        }
    }

    pub fn is_listed(&self) -> bool {
        self.visibility_status().is_some_and(VisibilityStatus::is_listed)
    }

    pub fn is_visible_to(&self, role: ViewerRole) -> bool {
        self.visibility_status()
            .is_none_or(|status| role.can_see(status))
    }

    /// Churches and counties are addressed by slug only, so without one they
    /// have no page to open. Affiliations fall back to their id.
    pub fn is_routable(&self) -> bool {
        match self {
            Self::Church(_) | Self::County(_) => self.url_slug().is_some(),
            Self::Affiliation(_) => true,
        }
    }

    /// Path the browser navigates to when this item is chosen.
    pub fn canonical_path(&self) -> String {
        match self {
            Self::Church(c) => format!("/entities/{}", c.url_slug),
            Self::County(c) => format!("/regions/{}", c.url_slug),
            Self::Affiliation(a) => match a.url_slug.as_deref().filter(|s| !s.is_empty()) {
                Some(slug) => format!("/networks/{slug}"),
                None => format!("/networks/{}", a.id),
            },
        }
    }
}

impl From<Church> for SearchableItem {
    fn from(value: Church) -> Self {
        Self::Church(value)
    }
}

impl From<County> for SearchableItem {
    fn from(value: County) -> Self {
        Self::County(value)
    }
}

impl From<Affiliation> for SearchableItem {
    fn from(value: Affiliation) -> Self {
        Self::Affiliation(value)
    }
}

/// The three collections the search is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Churches,
    Counties,
    Affiliations,
}

impl CollectionKind {
    pub const ALL: [Self; 3] = [Self::Churches, Self::Counties, Self::Affiliations];

    /// Fixed storage key for this collection's cache entry.
    pub fn cache_key(self) -> &'static str {
        match self {
            Self::Churches => "steeple.search.churches",
            Self::Counties => "steeple.search.counties",
            Self::Affiliations => "steeple.search.affiliations",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Churches => "churches",
            Self::Counties => "counties",
            Self::Affiliations => "affiliations",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of the three collections, as fetched or as read from cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    pub churches: Vec<Church>,
    pub counties: Vec<County>,
    pub affiliations: Vec<Affiliation>,
}

impl Collections {
    pub fn len(&self) -> usize {
        self.churches.len() + self.counties.len() + self.affiliations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Pure projection of session state into what the surface displays.

use steeple_data::SearchableItem;

use crate::{
    search::{RankedResult, website_host},
    session::{DataStatus, SessionState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Hidden,
    /// Data is taking long enough that a spinner is warranted.
    Loading,
    /// Nothing to search yet: data is still coming or failed to load.
    NotReady,
    /// Open with an empty query.
    Prompt,
    NoResults,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub kind_label: &'static str,
    pub title: String,
    pub subtitle: Option<String>,
    pub path: String,
    pub selected: bool,
    pub exact: bool,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub visible: bool,
    pub query: String,
    pub status: ViewStatus,
    pub rows: Vec<ResultRow>,
}

pub fn render(state: &SessionState) -> ViewModel {
    let status = status_of(state);
    let rows = if status == ViewStatus::Results {
        state
            .results
            .iter()
            .enumerate()
            .map(|(i, result)| row(result, state.selected_index == Some(i)))
            .collect()
    } else {
        Vec::new()
    };

    ViewModel {
        visible: state.is_open,
        query: state.query.clone(),
        status,
        rows,
    }
}

fn status_of(state: &SessionState) -> ViewStatus {
    if !state.is_open {
        return ViewStatus::Hidden;
    }
    if !state.data_ready {
        return match state.data_status {
            DataStatus::Loading if state.loading_visible => ViewStatus::Loading,
            DataStatus::Loading if state.query.trim().is_empty() => ViewStatus::Prompt,
            _ => ViewStatus::NotReady,
        };
    }
    if state.query.trim().is_empty() {
        ViewStatus::Prompt
    } else if state.results.is_empty() {
        ViewStatus::NoResults
    } else {
        ViewStatus::Results
    }
}

fn row(result: &RankedResult, selected: bool) -> ResultRow {
    let item = &result.item;
    ResultRow {
        kind_label: item.kind().label(),
        title: item.name().trim().to_string(),
        subtitle: subtitle(item),
        path: item.canonical_path(),
        selected,
        exact: result.exact_match,
        score: result.score,
    }
}

fn subtitle(item: &SearchableItem) -> Option<String> {
    let text = match item {
        SearchableItem::Church(church) => church
            .address
            .clone()
            .or_else(|| church.website_url.as_deref().and_then(website_host)),
        SearchableItem::County(county) => county.description.clone(),
        SearchableItem::Affiliation(affiliation) => affiliation.notes.clone(),
    };
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

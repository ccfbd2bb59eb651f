//! Quick search over a small directory
//!
//! This example loads a handful of churches, counties and affiliations, then
//! walks a session through the keystrokes a visitor would make: opening the
//! surface with the shortcut, typing, moving the highlight and committing.
//!
//! Pass a path to a JSON file shaped like `{"churches": [...], "counties":
//! [...], "affiliations": [...]}` to search your own data instead.

use std::time::Instant;

use steeple::{
    Collections, Key, KeyEvent, QuickSearch, SearchConfigBuilder, ViewModel, ViewStatus,
    ViewerRole,
};

const SAMPLE: &str = r#"{
  "churches": [
    {"id": 1, "name": "Grace Community Church", "urlSlug": "grace-community",
     "address": "400 Oak Ave", "websiteUrl": "https://www.gracecc.org", "visibilityStatus": "listed"},
    {"id": 2, "name": "Community Church", "urlSlug": "community-church", "visibilityStatus": "listed"},
    {"id": 3, "name": "First Baptist Church of Austin", "urlSlug": "fbc-austin",
     "websiteUrl": "fbcaustin.org", "visibilityStatus": "pending"},
    {"id": 4, "name": "Harvest Fellowship", "urlSlug": "harvest", "visibilityStatus": "heretical"}
  ],
  "counties": [
    {"id": 10, "name": "Travis County", "urlSlug": "travis", "description": "Central Texas"}
  ],
  "affiliations": [
    {"id": 20, "name": "Presbyterian Church in America", "urlSlug": "pca"},
    {"id": 21, "name": "Southern Baptist Convention", "notes": "Cooperative Program"}
  ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    steeple::init_logging(tracing::Level::INFO)?;

    let collections: Collections = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::from_str(SAMPLE)?,
    };

    for role in [ViewerRole::None, ViewerRole::Admin] {
        println!("=== Viewing as {role:?} ===\n");
        let config = SearchConfigBuilder::new().viewer_role(role).build();
        run_session(QuickSearch::new(config), &collections);
    }

    Ok(())
}

fn run_session(mut search: QuickSearch, collections: &Collections) {
    let now = Instant::now();

    let outcome = search.handle_key(&KeyEvent::new(Key::Char('/')), now);
    println!("'/' pressed, effects: {:?}", outcome.effects);

    // The host would fetch here; a query typed meanwhile is kept.
    search.type_query("gcc", now);
    print_view(&search.view());
    search.data_arrived(collections, now);
    print_view(&search.view());

    for query in ["comunity", "church", "harvest", "baptist"] {
        search.type_query(query, now);
        print_view(&search.view());
    }

    search.handle_key(&KeyEvent::new(Key::ArrowDown), now);
    let outcome = search.handle_key(&KeyEvent::new(Key::Enter), now);
    println!("Enter pressed, effects: {:?}\n", outcome.effects);
}

fn print_view(view: &ViewModel) {
    println!("query {:?}: {:?}", view.query, view.status);
    if view.status != ViewStatus::Results {
        return;
    }
    for row in &view.rows {
        let marker = if row.selected { ">" } else { " " };
        let how = match row.score {
            Some(score) => format!("fuzzy {score:.2}"),
            None => "exact".to_string(),
        };
        println!(
            "  {marker} [{:<11}] {:<32} {:<24} {how}",
            row.kind_label,
            row.title,
            row.subtitle.as_deref().unwrap_or("")
        );
    }
    println!();
}

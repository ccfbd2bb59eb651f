//! Steeple - quick search for a church directory
//!
//! Steeple answers every keystroke of a directory's search box from an
//! in-memory index over three collections: churches, counties and
//! affiliations. It degrades gracefully while the collections are still
//! loading, ranks exact matches with the directory's own tie-breaks, falls
//! back to fuzzy matching when nothing matches exactly, hides restricted
//! listings from unprivileged viewers and warms the page the user is most
//! likely to open next.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Instant;
//!
//! use steeple::{Church, Collections, Effect, QuickSearch, SearchConfig, VisibilityStatus};
//!
//! let mut search = QuickSearch::new(SearchConfig::default());
//! let now = Instant::now();
//!
//! // Opening without data asks the host to load it.
//! assert_eq!(search.open(now), vec![Effect::LoadData]);
//!
//! // Typing before the data arrives is remembered...
//! search.type_query("gcc", now);
//!
//! let collections = Collections {
//!     churches: vec![Church {
//!         id: 1,
//!         name: "Grace Community Church".to_string(),
//!         url_slug: "grace-community".to_string(),
//!         address: None,
//!         website_url: None,
//!         visibility_status: VisibilityStatus::Listed,
//!     }],
//!     ..Default::default()
//! };
//!
//! // ...and replayed once it does.
//! search.data_arrived(&collections, now);
//! assert_eq!(search.state().results.len(), 1);
//! assert_eq!(
//!     search.commit(),
//!     vec![Effect::Navigate("/entities/grace-community".to_string())]
//! );
//! ```
//!
//! # Layout
//!
//! - [`search`]: index, exact pass and fuzzy fallback ([`match_query`])
//! - [`QuickSearch`]: the synchronous session state machine
//! - [`render()`]: pure projection of session state into a [`ViewModel`]
//! - [`SearchRuntime`]: async driver that owns a session, spawns fetches and
//!   expires timers
//! - [`data`]: entity model, cache and collection sources
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
pub mod error;
mod prefetch;
pub mod render;
mod runtime;
pub mod search;
mod session;
mod timer;

pub use config::{FuzzyBuilder, SearchConfig, SearchConfigBuilder};
pub use prefetch::{IntentChannel, PrefetchScheduler};
pub use render::{ResultRow, ViewModel, ViewStatus, render};
pub use runtime::{Navigator, SearchRuntime, UiEvent};
pub use search::{FuzzyParams, MatchParams, RankedResult, ResultLimits, SearchIndex, match_query};
pub use session::{
    DataStatus, Effect, FocusTarget, Key, KeyEvent, KeyOutcome, QuickSearch, SessionPhase,
    SessionState,
};
pub use steeple_data as data;
pub use steeple_data::{
    Affiliation, Church, Collections, County, EntityKind, SearchableItem, ViewerRole,
    VisibilityStatus,
};
pub use timer::Deadline;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Steeple library.
///
/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` when set, or by
/// `level` otherwise. HTTP client internals are kept at `warn`. Safe to call
/// more than once; only the first call installs anything.
///
/// # Examples
///
/// ```rust
/// use steeple::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), steeple::error::SteepleError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::SteepleError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    })
}

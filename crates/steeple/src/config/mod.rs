use std::time::Duration;

use steeple_data::ViewerRole;

use crate::{
    error::SteepleError,
    search::{FuzzyParams, MatchParams, ResultLimits},
};

/// Everything a quick-search session needs to know up front.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Result caps and fuzzy parameters handed to the match engine
    pub matching: MatchParams,
    /// How long data may be loading before the spinner is shown
    pub loading_delay: Duration,
    /// Quiet period after a keyboard selection before its page is hinted
    pub selection_debounce: Duration,
    /// Quiet period after a pointer hover before its page is hinted
    pub hover_debounce: Duration,
    /// The single non-modifier key that opens the search surface
    pub shortcut_key: char,
    /// Role of the current viewer, supplied by the host page
    pub viewer_role: ViewerRole,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            matching: MatchParams::default(),
            loading_delay: Duration::from_millis(150),
            selection_debounce: Duration::from_millis(100),
            hover_debounce: Duration::from_millis(65),
            shortcut_key: '/',
            viewer_role: ViewerRole::None,
        }
    }
}

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Fewer, closer matches: a higher fuzzy threshold and longer minimum query
    pub fn strict() -> Self {
        let mut builder = Self::new();
        builder.config.matching.fuzzy = FuzzyParams {
            threshold: 0.7,
            min_query_chars: 4,
        };
        builder
    }

    /// More forgiving fuzzy matching and a longer result list
    pub fn lenient() -> Self {
        let mut builder = Self::new();
        builder.config.matching.fuzzy.threshold = 0.4;
        builder.config.matching.limits = ResultLimits {
            max_results: 15,
            churches: 8,
            counties: 4,
            affiliations: 3,
        };
        builder
    }

    /// Set the maximum number of results to return
    pub fn max_results(mut self, max: usize) -> Self {
        self.config.matching.limits.max_results = max;
        self
    }

    /// Set how many exact matches each collection may contribute
    pub fn per_kind_caps(mut self, churches: usize, counties: usize, affiliations: usize) -> Self {
        let limits = &mut self.config.matching.limits;
        limits.churches = churches;
        limits.counties = counties;
        limits.affiliations = affiliations;
        self
    }

    pub fn loading_delay(mut self, delay: Duration) -> Self {
        self.config.loading_delay = delay;
        self
    }

    /// Set the selection and hover prefetch debounce periods
    pub fn prefetch_debounce(mut self, selection: Duration, hover: Duration) -> Self {
        self.config.selection_debounce = selection;
        self.config.hover_debounce = hover;
        self
    }

    /// Set the key that opens the search. Control characters and whitespace are rejected.
    pub fn shortcut_key(mut self, key: char) -> Result<Self, SteepleError> {
        if key.is_control() || key.is_whitespace() {
            return Err(SteepleError::ConfigError(format!(
                "Shortcut key must be a printable character, got {key:?}"
            )));
        }
        self.config.shortcut_key = key;
        Ok(self)
    }

    pub fn viewer_role(mut self, role: ViewerRole) -> Self {
        self.config.viewer_role = role;
        self
    }

    /// Configure the fuzzy fallback
    pub fn fuzzy(self) -> FuzzyBuilder {
        FuzzyBuilder::new(self)
    }

    /// Build the final configuration
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// Builder for the fuzzy fallback parameters
pub struct FuzzyBuilder {
    parent: SearchConfigBuilder,
}

impl FuzzyBuilder {
    fn new(parent: SearchConfigBuilder) -> Self {
        Self { parent }
    }

    /// Set the minimum similarity a fuzzy result needs (must be in `(0, 1]`)
    pub fn threshold(mut self, threshold: f64) -> Result<Self, SteepleError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(SteepleError::ConfigError(format!(
                "Fuzzy threshold must be in (0, 1], got {threshold}"
            )));
        }
        self.parent.config.matching.fuzzy.threshold = threshold;
        Ok(self)
    }

    /// Set the shortest query that reaches the fuzzy pass
    pub fn min_query_chars(mut self, chars: usize) -> Self {
        self.parent.config.matching.fuzzy.min_query_chars = chars.max(1);
        self
    }

    /// Never run the fuzzy pass
    pub fn disabled(mut self) -> Self {
        self.parent.config.matching.fuzzy.min_query_chars = usize::MAX;
        self
    }

    /// Return to the main configuration builder
    pub fn done(self) -> SearchConfigBuilder {
        self.parent
    }
}

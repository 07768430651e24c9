use std::time::Duration;

use deeplibby_config::SearchSettings;
use deeplibby_model::SearchResult;

use crate::error::ApiError;

/// Where the controller is in the lifecycle of the latest input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Debouncing,
    InFlight,
}

/// How the most recent request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Completed,
    Cancelled,
    Failed,
}

/// Viewport class used to pick the debounce delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationContext {
    Compact,
    Wide,
}

impl PresentationContext {
    pub fn from_width(width: u32, settings: &SearchSettings) -> Self {
        if width <= settings.compact_max_width {
            PresentationContext::Compact
        } else {
            PresentationContext::Wide
        }
    }

    pub fn debounce(self, settings: &SearchSettings) -> Duration {
        match self {
            PresentationContext::Compact => settings.compact_debounce,
            PresentationContext::Wide => settings.wide_debounce,
        }
    }
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    /// A ranked result set replaced the visible one.
    Results {
        generation: u64,
        query: String,
        results: Vec<SearchResult>,
    },
    /// Input went empty; nothing is visible.
    Cleared,
    /// The request for the current input failed. Visible results stay.
    Failed {
        generation: u64,
        query: String,
        error: ApiError,
    },
}

/// Snapshot of controller state for rendering.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub query: String,
    pub phase: SearchPhase,
    pub last_outcome: Option<SearchOutcome>,
    pub results: Vec<SearchResult>,
    /// Generation of the request that produced `results`.
    pub results_generation: Option<u64>,
    pub error: Option<ApiError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_threshold_is_inclusive() {
        let settings = SearchSettings::default();
        assert_eq!(
            PresentationContext::from_width(900, &settings),
            PresentationContext::Compact
        );
        assert_eq!(
            PresentationContext::from_width(901, &settings),
            PresentationContext::Wide
        );
        assert_eq!(
            PresentationContext::Compact.debounce(&settings),
            Duration::from_millis(700)
        );
        assert_eq!(
            PresentationContext::Wide.debounce(&settings),
            Duration::from_millis(100)
        );
    }
}

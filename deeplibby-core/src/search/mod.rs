//! As-you-type search: debounce, cancellation and client-side ranking.

mod controller;
mod ranker;
mod types;

pub use controller::SearchQueryController;
pub use ranker::{RelevanceRanker, longest_common_substring};
pub use types::{
    PresentationContext, SearchEvent, SearchOutcome, SearchPhase, SearchView,
};

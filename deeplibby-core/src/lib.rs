//! DeepLibby client core.
//!
//! Search input goes through [`search::SearchQueryController`], which
//! debounces, cancels superseded requests and ranks results with
//! [`search::RelevanceRanker`]. Selecting a result loads an
//! [`availability::AvailabilitySnapshotLoader`] snapshot annotated from
//! [`favorites::FavoritesRepository`]; a per-snapshot
//! [`availability::LiveRefreshScheduler`] then refreshes rows against the
//! upstream API in staggered, bounded waves.
#![allow(missing_docs)]

pub mod api;
pub mod availability;
pub mod catalog;
pub mod compare;
pub mod error;
pub mod favorites;
pub mod favorites_scan;
pub mod search;
pub mod store;
pub mod time;

#[cfg(test)]
mod testing;

pub use api::{
    ApiClient, ApiService, LibraryCatalog, UpstreamAvailabilityService,
    UpstreamClient,
};
pub use availability::{
    AvailabilitySnapshotLoader, LiveRefreshScheduler, RefreshEvent,
    SharedSnapshot, WavePlan,
};
pub use catalog::{CatalogEntry, LibraryDirectory};
pub use compare::{ComparisonLoader, LibraryPair};
pub use error::{
    ApiError, CompareError, FavoritesError, LoadError, RefreshError,
    StoreError,
};
pub use favorites::{FavoriteSet, FavoritesRepository, MigrationReport};
pub use favorites_scan::{FavoritesAvailabilityScan, ScanStatus, ScanSummary};
pub use search::{RelevanceRanker, SearchEvent, SearchQueryController};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use time::{SystemTimeProvider, TimeProvider, VirtualTimeProvider};

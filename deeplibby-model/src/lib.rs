//! Core data model definitions shared across DeepLibby crates.
#![allow(missing_docs)]

pub mod availability;
pub mod compare;
pub mod error;
pub mod ids;
pub mod library;
pub mod links;
pub mod media;
#[cfg(feature = "serde")]
mod nullable;
pub mod upstream;

// Intentionally curated re-exports for downstream consumers.
pub use availability::{AvailabilityRow, AvailabilitySnapshot};
pub use compare::{
    DiffEntry, DiffResponse, HoldingCounts, IntersectEntry, IntersectResponse,
    LibraryHolding, UniqueEntry, UniqueResponse,
};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{LegacyLibraryId, LibraryId, MediaId};
pub use library::{Library, LibraryResponse};
pub use media::{Creator, SearchResponse, SearchResult};
pub use upstream::{
    UpstreamAvailabilityItem, UpstreamAvailabilityRequest,
    UpstreamAvailabilityResponse,
};

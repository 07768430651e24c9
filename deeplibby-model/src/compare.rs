//! Payloads of the collection comparison endpoints (`/api/diff`,
//! `/api/intersect`, `/api/unique`).

use crate::library::Library;
use crate::media::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HoldingCounts {
    #[cfg_attr(feature = "serde", serde(default))]
    pub owned_count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub available_count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub holds_count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub estimated_wait_days: i32,
}

/// Counts for one title at one named library.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibraryHolding {
    pub library: Library,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub counts: HoldingCounts,
}

/// A title owned by the left library but not by the right one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiffEntry {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub media: SearchResult,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub holding: LibraryHolding,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiffResponse {
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub diff: Vec<DiffEntry>,
}

/// A title owned by both libraries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct IntersectEntry {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub media: SearchResult,
    #[cfg_attr(feature = "serde", serde(rename = "leftLibraryMediaCounts"))]
    pub left: LibraryHolding,
    #[cfg_attr(feature = "serde", serde(rename = "rightLibraryMediaCounts"))]
    pub right: LibraryHolding,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectResponse {
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub intersect: Vec<IntersectEntry>,
}

/// A title no other library owns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniqueEntry {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub media: SearchResult,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub counts: HoldingCounts,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniqueResponse {
    pub library: Library,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub unique: Vec<UniqueEntry>,
}

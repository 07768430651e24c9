use crate::ids::{LegacyLibraryId, LibraryId};

/// A library collection known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Library {
    pub id: LibraryId,
    /// Numeric id from the legacy favorites scheme.
    #[cfg_attr(feature = "serde", serde(rename = "websiteId", default))]
    pub legacy_id: LegacyLibraryId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_consortium: bool,
}

impl Library {
    pub fn new(
        id: LibraryId,
        legacy_id: LegacyLibraryId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            legacy_id,
            name: name.into(),
            is_consortium: false,
        }
    }
}

/// Body of `GET /api/libraries`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibraryResponse {
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub libraries: Vec<Library>,
}

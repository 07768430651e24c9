use crate::ids::LibraryId;
use crate::library::Library;
use crate::media::SearchResult;

/// Availability of one media item at one library.
///
/// `favorite` and `fresh` are client-side annotations and are never read
/// from the wire: `favorite` is filled in from the favorites set when a
/// snapshot loads, and `fresh` flips to `true` once a live refresh for the
/// library has been reconciled into the row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AvailabilityRow {
    pub library: Library,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub owned_count: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub available_count: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub holds_count: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub estimated_wait_days: i32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub formats: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip_deserializing))]
    pub favorite: bool,
    #[cfg_attr(feature = "serde", serde(skip_deserializing))]
    pub fresh: bool,
}

impl AvailabilityRow {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            owned_count: 0,
            available_count: 0,
            holds_count: 0,
            estimated_wait_days: 0,
            formats: Vec::new(),
            favorite: false,
            fresh: false,
        }
    }

    pub fn with_counts(
        mut self,
        owned: u32,
        available: u32,
        holds: u32,
        estimated_wait_days: i32,
    ) -> Self {
        self.owned_count = owned;
        self.available_count = available;
        self.holds_count = holds;
        self.estimated_wait_days = estimated_wait_days;
        self
    }

    pub fn library_id(&self) -> &LibraryId {
        &self.library.id
    }

    pub fn is_available_now(&self) -> bool {
        self.available_count > 0
    }
}

/// Everything known about one selected media item: its descriptive fields
/// plus one availability row per library carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvailabilitySnapshot {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub media: SearchResult,
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "availability",
            default,
            deserialize_with = "crate::nullable::or_default"
        )
    )]
    pub rows: Vec<AvailabilityRow>,
}

impl AvailabilitySnapshot {
    pub fn new(media: SearchResult, rows: Vec<AvailabilityRow>) -> Self {
        Self { media, rows }
    }

    pub fn row_index(&self, library_id: &LibraryId) -> Option<usize> {
        self.rows.iter().position(|row| row.library_id() == library_id)
    }

    pub fn row(&self, library_id: &LibraryId) -> Option<&AvailabilityRow> {
        self.rows.iter().find(|row| row.library_id() == library_id)
    }

    /// Replace the row for `row.library.id`, returning the previous value.
    pub fn replace_row(
        &mut self,
        row: AvailabilityRow,
    ) -> Option<AvailabilityRow> {
        let index = self.row_index(row.library_id())?;
        Some(std::mem::replace(&mut self.rows[index], row))
    }

    /// Library ids in row order, filtered by favorite status.
    pub fn library_ids(&self, favorite: bool) -> Vec<LibraryId> {
        self.rows
            .iter()
            .filter(|row| row.favorite == favorite)
            .map(|row| row.library_id().clone())
            .collect()
    }

    pub fn fresh_count(&self) -> usize {
        self.rows.iter().filter(|row| row.fresh).count()
    }

    /// Rows in display priority: favorites first, then most copies
    /// available, then the shortest estimated wait.
    pub fn rows_by_priority(&self) -> Vec<&AvailabilityRow> {
        let mut rows: Vec<&AvailabilityRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.favorite
                .cmp(&a.favorite)
                .then_with(|| b.available_count.cmp(&a.available_count))
                .then_with(|| a.estimated_wait_days.cmp(&b.estimated_wait_days))
        });
        rows
    }
}

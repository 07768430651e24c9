//! Deep links into the Libby reader and the OverDrive catalog.
//!
//! Ids are validated as plain slugs on construction, so they can be
//! formatted into paths without escaping.

use crate::ids::{LibraryId, MediaId};

pub const LIBBY_BASE: &str = "https://libbyapp.com";
pub const OVERDRIVE_BASE: &str = "https://www.overdrive.com";

/// Libby's generated search id for direct title pages.
const LIBBY_TITLE_SEARCH: &str = "generated-36532";

pub fn libby_library_url(library_id: &LibraryId) -> String {
    format!("{LIBBY_BASE}/library/{library_id}/")
}

pub fn libby_media_url(library_id: &LibraryId, media_id: &MediaId) -> String {
    format!(
        "{LIBBY_BASE}/library/{library_id}/{LIBBY_TITLE_SEARCH}/page-1/{media_id}"
    )
}

pub fn overdrive_media_url(media_id: &MediaId) -> String {
    format!("{OVERDRIVE_BASE}/media/{media_id}")
}

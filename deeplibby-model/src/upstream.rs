//! Payloads of the third-party per-library availability endpoint.

use crate::ids::MediaId;

/// `POST /libraries/{libraryId}/media/availability` body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpstreamAvailabilityRequest {
    pub ids: Vec<MediaId>,
}

impl UpstreamAvailabilityRequest {
    pub fn single(media_id: MediaId) -> Self {
        Self {
            ids: vec![media_id],
        }
    }
}

/// Live counts for one media item at one library.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpstreamAvailabilityItem {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<MediaId>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub owned_copies: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub available_copies: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub holds_count: u32,
    /// Absent for titles that are available now or not holdable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub estimated_wait_days: Option<i32>,
}

impl UpstreamAvailabilityItem {
    /// Wait to show for this item: copies on the shelf mean no wait, and a
    /// missing estimate counts as no wait.
    pub fn normalized_wait_days(&self) -> i32 {
        match self.estimated_wait_days.unwrap_or(0) {
            wait if self.available_copies > 0 && wait > 0 => 0,
            wait => wait,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpstreamAvailabilityResponse {
    /// The upstream occasionally emits `null` entries.
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub items: Vec<Option<UpstreamAvailabilityItem>>,
}

impl UpstreamAvailabilityResponse {
    pub fn item_for(
        &self,
        media_id: &MediaId,
    ) -> Option<&UpstreamAvailabilityItem> {
        self.items
            .iter()
            .flatten()
            .find(|item| item.id.as_ref() == Some(media_id))
    }
}

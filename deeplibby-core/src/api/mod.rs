//! HTTP collaborators: the DeepLibby backend and the upstream per-library
//! availability API. Consumers depend on the traits so tests can swap in
//! stubs.

mod client;
mod upstream;

pub use client::ApiClient;
pub use upstream::UpstreamClient;

use async_trait::async_trait;
use deeplibby_model::{
    AvailabilitySnapshot, DiffEntry, IntersectEntry, Library, LibraryId,
    MediaId, SearchResult, UniqueResponse, UpstreamAvailabilityResponse,
};
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

use crate::error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Read-only queries against the DeepLibby backend.
#[async_trait]
pub trait ApiService: Send + Sync + Debug {
    /// `GET /api/search?q=`
    async fn search(&self, query: &str) -> ApiResult<Vec<SearchResult>>;

    /// `GET /api/availability?id=`
    async fn availability(
        &self,
        media_id: &MediaId,
    ) -> ApiResult<AvailabilitySnapshot>;

    /// Titles owned by `left` but not by `right`.
    async fn diff(
        &self,
        left: &LibraryId,
        right: &LibraryId,
    ) -> ApiResult<Vec<DiffEntry>>;

    /// Titles owned by both libraries.
    async fn intersect(
        &self,
        left: &LibraryId,
        right: &LibraryId,
    ) -> ApiResult<Vec<IntersectEntry>>;

    /// Titles owned only by `library`.
    async fn unique(&self, library: &LibraryId) -> ApiResult<UniqueResponse>;

    /// Media on a Hardcover user's want-to-read list.
    async fn search_hardcover(
        &self,
        username: &str,
        additional_filters: Option<&str>,
    ) -> ApiResult<Vec<SearchResult>>;
}

/// Full list of known libraries. Also backs legacy favorites migration.
#[async_trait]
pub trait LibraryCatalog: Send + Sync + Debug {
    async fn fetch_libraries(&self) -> ApiResult<Vec<Library>>;
}

/// Live counts straight from the third-party service.
#[async_trait]
pub trait UpstreamAvailabilityService: Send + Sync + Debug {
    async fn fetch_availability(
        &self,
        library: &LibraryId,
        media_ids: &[MediaId],
    ) -> ApiResult<UpstreamAvailabilityResponse>;
}

/// Map non-success statuses to [`ApiError::Status`] and decode the body.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: Response,
) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ApiError::Status { status, body });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
}

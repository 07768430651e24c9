use async_trait::async_trait;
use deeplibby_config::ServerSettings;
use deeplibby_model::{
    AvailabilitySnapshot, DiffEntry, DiffResponse, IntersectEntry,
    IntersectResponse, Library, LibraryId, LibraryResponse, MediaId,
    SearchResponse, SearchResult, UniqueResponse,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use super::{ApiResult, ApiService, LibraryCatalog, decode_response};

/// Client for the DeepLibby backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `settings.base_url` is expected to be normalized already (scheme,
    /// no trailing slash); the config loader guarantees that.
    pub fn new(settings: &ServerSettings) -> ApiResult<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        info!(base_url = %settings.base_url, "created backend client");

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an `/api/...` URL with the given query pairs.
    pub fn build_url(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<Url> {
        let path = path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/api/{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = self.build_url(path, query)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        decode_response(response).await
    }
}

#[async_trait]
impl ApiService for ApiClient {
    async fn search(&self, query: &str) -> ApiResult<Vec<SearchResult>> {
        let response: SearchResponse =
            self.get_json("search", &[("q", query)]).await?;
        Ok(response.results)
    }

    async fn availability(
        &self,
        media_id: &MediaId,
    ) -> ApiResult<AvailabilitySnapshot> {
        self.get_json("availability", &[("id", media_id.as_str())])
            .await
    }

    async fn diff(
        &self,
        left: &LibraryId,
        right: &LibraryId,
    ) -> ApiResult<Vec<DiffEntry>> {
        let response: DiffResponse = self
            .get_json(
                "diff",
                &[
                    ("leftLibraryId", left.as_str()),
                    ("rightLibraryId", right.as_str()),
                ],
            )
            .await?;
        Ok(response.diff)
    }

    async fn intersect(
        &self,
        left: &LibraryId,
        right: &LibraryId,
    ) -> ApiResult<Vec<IntersectEntry>> {
        let response: IntersectResponse = self
            .get_json(
                "intersect",
                &[
                    ("leftLibraryId", left.as_str()),
                    ("rightLibraryId", right.as_str()),
                ],
            )
            .await?;
        Ok(response.intersect)
    }

    async fn unique(&self, library: &LibraryId) -> ApiResult<UniqueResponse> {
        self.get_json("unique", &[("libraryId", library.as_str())])
            .await
    }

    async fn search_hardcover(
        &self,
        username: &str,
        additional_filters: Option<&str>,
    ) -> ApiResult<Vec<SearchResult>> {
        let mut query = vec![("username", username)];
        if let Some(filters) = additional_filters {
            query.push(("additionalFilters", filters));
        }
        let results: Option<Vec<SearchResult>> =
            self.get_json("search-hardcover", &query).await?;
        Ok(results.unwrap_or_default())
    }
}

#[async_trait]
impl LibraryCatalog for ApiClient {
    async fn fetch_libraries(&self) -> ApiResult<Vec<Library>> {
        let response: LibraryResponse = self.get_json("libraries", &[]).await?;
        Ok(response.libraries)
    }
}

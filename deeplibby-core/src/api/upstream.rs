use async_trait::async_trait;
use deeplibby_config::UpstreamSettings;
use deeplibby_model::{
    LibraryId, MediaId, UpstreamAvailabilityRequest,
    UpstreamAvailabilityResponse,
};
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::{ApiResult, UpstreamAvailabilityService, decode_response};
use crate::error::ApiError;

/// Client for the third-party per-library availability endpoint.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(settings: &UpstreamSettings) -> ApiResult<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        let base_url = Url::parse(&settings.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }
        info!(base_url = %base_url, "created upstream client");

        Ok(Self { client, base_url })
    }

    /// `{base}/libraries/{library}/media/availability`, with the library id
    /// percent-encoded as a single path segment.
    pub fn availability_url(&self, library: &LibraryId) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["libraries", library.as_str(), "media", "availability"]);
        Ok(url)
    }
}

#[async_trait]
impl UpstreamAvailabilityService for UpstreamClient {
    async fn fetch_availability(
        &self,
        library: &LibraryId,
        media_ids: &[MediaId],
    ) -> ApiResult<UpstreamAvailabilityResponse> {
        let url = self.availability_url(library)?;
        let body = UpstreamAvailabilityRequest {
            ids: media_ids.to_vec(),
        };
        debug!(%url, ids = media_ids.len(), "POST upstream availability");

        let response = self.client.post(url).json(&body).send().await?;
        decode_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_url_appends_segments() {
        let client = UpstreamClient::new(&UpstreamSettings::default()).unwrap();
        let url = client
            .availability_url(&LibraryId::parse("lapl").unwrap())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://thunder.api.overdrive.com/v2/libraries/lapl/media/availability"
        );
    }

    #[test]
    fn trailing_slash_base_does_not_double_up() {
        let client = UpstreamClient::new(&UpstreamSettings {
            base_url: "http://127.0.0.1:9000/v2/".to_string(),
            ..UpstreamSettings::default()
        })
        .unwrap();
        let url = client
            .availability_url(&LibraryId::parse("nypl").unwrap())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/v2/libraries/nypl/media/availability"
        );
    }
}

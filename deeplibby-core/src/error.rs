use std::path::PathBuf;

use deeplibby_model::LibraryId;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the backend or the upstream availability API.
///
/// Cloneable so it can be handed to several observers over event channels.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidUrl(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write store {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store {path} is not a JSON object of strings")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored value under '{key}' is not a JSON id list")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("library catalog lookup failed")]
    Catalog(#[source] ApiError),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load availability: {0}")]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error("upstream refresh failed for {library}: {source}")]
    Upstream {
        library: LibraryId,
        #[source]
        source: ApiError,
    },
    #[error("upstream returned no item for the media at {library}")]
    MissingItem { library: LibraryId },
    #[error("library {library} is not part of the snapshot")]
    UnknownLibrary { library: LibraryId },
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("a comparison is already in flight")]
    Busy,
    #[error("select two libraries to compare")]
    Incomplete,
    #[error(transparent)]
    Api(#[from] ApiError),
}

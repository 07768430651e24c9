use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use deeplibby_config::{ClientConfig, ConfigLoader, normalize_base_url};
use deeplibby_core::{
    ApiClient, AvailabilitySnapshotLoader, ComparisonLoader,
    FavoritesAvailabilityScan, FavoritesRepository, JsonFileStore,
    LibraryDirectory, SystemTimeProvider, TimeProvider, UpstreamClient,
};
use tracing::debug;

use crate::GlobalOpts;

/// Everything a subcommand needs, wired from one resolved config.
#[derive(Debug)]
pub struct AppContext {
    pub config: ClientConfig,
    pub api: Arc<ApiClient>,
    pub upstream: Arc<UpstreamClient>,
    pub favorites: Arc<FavoritesRepository>,
    pub time: Arc<dyn TimeProvider>,
}

impl AppContext {
    pub fn build(opts: &GlobalOpts) -> Result<Self> {
        let mut loader = ConfigLoader::new().with_env_file(true);
        if let Some(path) = &opts.config {
            loader = loader.with_path(path);
        }
        let load = loader.load().context("failed to load configuration")?;
        let mut config = load.config;

        if let Some(server) = &opts.server {
            config.server.base_url = normalize_base_url("server", server)?;
        }

        let store_path: PathBuf = opts
            .store
            .clone()
            .unwrap_or_else(|| config.favorites.resolved_store_path());
        let store = JsonFileStore::open(store_path.clone()).with_context(|| {
            format!("failed to open store at {}", store_path.display())
        })?;
        debug!(path = %store_path.display(), "favorites store ready");

        let api = Arc::new(
            ApiClient::new(&config.server)
                .context("failed to build DeepLibby API client")?,
        );
        let upstream = Arc::new(
            UpstreamClient::new(&config.upstream)
                .context("failed to build upstream client")?,
        );
        let favorites = Arc::new(
            FavoritesRepository::new(Arc::new(store), api.clone())
                .with_alias_policy(config.favorites.legacy_alias_policy),
        );

        Ok(Self {
            config,
            api,
            upstream,
            favorites,
            time: Arc::new(SystemTimeProvider),
        })
    }

    pub fn snapshot_loader(&self) -> AvailabilitySnapshotLoader {
        AvailabilitySnapshotLoader::new(
            self.api.clone(),
            Arc::clone(&self.favorites),
        )
    }

    pub fn directory(&self) -> LibraryDirectory {
        LibraryDirectory::new(self.api.clone(), Arc::clone(&self.favorites))
    }

    pub fn comparison(&self) -> ComparisonLoader {
        ComparisonLoader::new(self.api.clone())
    }

    pub fn favorites_scan(&self) -> FavoritesAvailabilityScan {
        FavoritesAvailabilityScan::new(
            self.upstream.clone(),
            Arc::clone(&self.favorites),
            Arc::clone(&self.time),
            self.config.refresh.favorites_base_delay,
        )
    }
}

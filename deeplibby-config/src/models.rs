use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Source that produced the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Top-level client settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub search: SearchSettings,
    pub refresh: RefreshSettings,
    pub favorites: FavoritesSettings,
}

/// The DeepLibby backend serving search, availability and library data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: String,
    #[serde(with = "crate::duration")]
    pub timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// The third-party per-library availability API used for live refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub base_url: String,
    #[serde(with = "crate::duration")]
    pub timeout: Duration,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://thunder.api.overdrive.com/v2".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Debounce tuning for as-you-type search. Constrained (narrow) viewports
/// get the longer delay since typing there is slower and requests costlier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    #[serde(with = "crate::duration")]
    pub compact_debounce: Duration,
    #[serde(with = "crate::duration")]
    pub wide_debounce: Duration,
    /// Widths at or below this count as constrained.
    pub compact_max_width: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            compact_debounce: Duration::from_millis(700),
            wide_debounce: Duration::from_millis(100),
            compact_max_width: 900,
        }
    }
}

/// Live refresh pacing. Each wave staggers its libraries by `k * base`
/// delay; non-favorite offsets are additionally shifted by `inter_wave_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshSettings {
    #[serde(with = "crate::duration")]
    pub favorites_base_delay: Duration,
    #[serde(with = "crate::duration")]
    pub non_favorites_base_delay: Duration,
    #[serde(with = "crate::duration")]
    pub inter_wave_delay: Duration,
    /// Upper bound on concurrent upstream requests.
    pub max_in_flight: usize,
    /// Cancel outstanding refreshes when the scheduler is torn down.
    pub cancel_on_teardown: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            favorites_base_delay: Duration::from_millis(100),
            non_favorites_base_delay: Duration::from_millis(500),
            inter_wave_delay: Duration::ZERO,
            max_in_flight: 6,
            cancel_on_teardown: true,
        }
    }
}

/// How a legacy numeric id shared by several libraries migrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyAliasPolicy {
    /// Every library carrying the legacy id becomes a favorite.
    #[default]
    All,
    /// Only the first library (catalog order) carrying the id.
    First,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FavoritesSettings {
    /// JSON store file. `None` resolves to the platform data directory.
    pub store_path: Option<PathBuf>,
    pub legacy_alias_policy: LegacyAliasPolicy,
}

impl FavoritesSettings {
    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("deeplibby")
                .join("store.json")
        })
    }
}

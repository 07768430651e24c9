//! Configuration for the DeepLibby client.
//!
//! Settings are resolved once at startup from (in order) an explicit file
//! path, an inline JSON blob, a default file location, or the built-in
//! defaults. URL overrides from the environment are applied afterwards and
//! the result is checked by [`apply_guard_rails`] before anything else in
//! the workspace sees it.

pub mod duration;
pub mod error;
pub mod loader;
pub mod models;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, normalize_base_url};
pub use models::{
    ClientConfig, ConfigSource, FavoritesSettings, LegacyAliasPolicy,
    RefreshSettings, SearchSettings, ServerSettings, UpstreamSettings,
};
pub use validation::{
    ConfigGuardRailError, ConfigWarning, ConfigWarnings, apply_guard_rails,
};

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::ConfigLoadError,
    models::{ClientConfig, ConfigSource},
    validation::{ConfigWarnings, apply_guard_rails},
};

pub const CONFIG_PATH_ENV: &str = "DEEPLIBBY_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "DEEPLIBBY_CONFIG_JSON";
pub const SERVER_URL_ENV: &str = "DEEPLIBBY_SERVER_URL";
pub const UPSTREAM_URL_ENV: &str = "DEEPLIBBY_UPSTREAM_URL";

/// Result of a successful load: the validated config plus where it came
/// from and any non-fatal findings.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: ClientConfig,
    pub source: ConfigSource,
    pub warnings: ConfigWarnings,
    pub env_file_loaded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    load_env_file: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this file instead of the environment-driven lookup.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Read a `.env` file from the working directory before resolving.
    pub fn with_env_file(mut self, enabled: bool) -> Self {
        self.load_env_file = enabled;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = if self.load_env_file {
            match dotenvy::dotenv() {
                Ok(path) => {
                    debug!(path = %path.display(), "loaded .env file");
                    true
                }
                Err(err) if err.not_found() => false,
                Err(err) => return Err(err.into()),
            }
        } else {
            false
        };

        let mut load = self.load_with(|key| env::var(key).ok())?;
        load.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolve configuration using `lookup` for environment variables.
    ///
    /// Evaluation order:
    /// 1) the explicit path, if one was given,
    /// 2) `$DEEPLIBBY_CONFIG_PATH` (TOML or JSON file),
    /// 3) `$DEEPLIBBY_CONFIG_JSON` (inline JSON),
    /// 4) the first default file that exists,
    /// 5) defaults.
    ///
    /// URL overrides are applied afterwards, then guard rails.
    pub fn load_with<F>(&self, lookup: F) -> Result<ConfigLoad, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty =
            |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let (mut config, source) = if let Some(path) = &self.explicit_path {
            (
                ClientConfig::load_from_file(path)?,
                ConfigSource::File(path.clone()),
            )
        } else if let Some(path) = non_empty(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            (
                ClientConfig::load_from_file(&path)?,
                ConfigSource::EnvPath(path),
            )
        } else if let Some(raw) = non_empty(CONFIG_JSON_ENV) {
            (
                ClientConfig::parse_json(&raw, CONFIG_JSON_ENV)?,
                ConfigSource::EnvInline,
            )
        } else if let Some(path) = ClientConfig::find_default_file() {
            (ClientConfig::load_from_file(&path)?, ConfigSource::File(path))
        } else {
            (ClientConfig::default(), ConfigSource::Default)
        };

        if let Some(url) = non_empty(SERVER_URL_ENV) {
            config.server.base_url = url;
        }
        if let Some(url) = non_empty(UPSTREAM_URL_ENV) {
            config.upstream.base_url = url;
        }

        config.server.base_url =
            normalize_base_url("server", &config.server.base_url)?;
        config.upstream.base_url =
            normalize_base_url("upstream", &config.upstream.base_url)?;

        let warnings = apply_guard_rails(&config)?;
        for warning in &warnings.items {
            match &warning.hint {
                Some(hint) => warn!(hint = %hint, "{}", warning.message),
                None => warn!("{}", warning.message),
            }
        }
        info!(source = ?source, server = %config.server.base_url, "configuration loaded");

        Ok(ConfigLoad {
            config,
            source,
            warnings,
            env_file_loaded: false,
        })
    }
}

impl ClientConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            ConfigLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let origin = path.display().to_string();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents, &origin),
            Some("toml") | Some("tml") => toml::from_str(&contents).map_err(
                |err| ConfigLoadError::Parse {
                    origin,
                    reason: err.to_string(),
                },
            ),
            _ => Self::parse_from_str(&contents, &origin),
        }
    }

    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> Result<Self, ConfigLoadError> {
        // Try TOML first, then JSON for convenience.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                ConfigLoadError::Parse {
                    origin: origin.to_string(),
                    reason: format!(
                        "toml error: {toml_err}; json error: {json_err}"
                    ),
                }
            })
        })
    }

    pub fn parse_json(raw: &str, origin: &str) -> Result<Self, ConfigLoadError> {
        serde_json::from_str(raw).map_err(|err| ConfigLoadError::Parse {
            origin: origin.to_string(),
            reason: err.to_string(),
        })
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "deeplibby.toml",
            "deeplibby.json",
            "config/deeplibby.toml",
        ];

        CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(
                dirs::config_dir()
                    .map(|dir| dir.join("deeplibby").join("config.toml")),
            )
            .find(|path| path.exists())
    }
}

/// Add `http://` when no scheme is given and trim trailing slashes, so
/// `localhost:8080/` and `http://localhost:8080` resolve identically.
pub fn normalize_base_url(
    field: &'static str,
    raw: &str,
) -> Result<String, ConfigLoadError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme =
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

    Url::parse(&with_scheme).map_err(|source| ConfigLoadError::InvalidUrl {
        field,
        value: raw.to_string(),
        source,
    })?;
    Ok(with_scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn normalizes_scheme_and_trailing_slash() {
        assert_eq!(
            normalize_base_url("server", "localhost:8080/").unwrap(),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_base_url("server", "https://deeplibby.app//").unwrap(),
            "https://deeplibby.app"
        );
        assert!(normalize_base_url("server", "http://[::1").is_err());
    }

    #[test]
    fn inline_json_then_url_override() {
        let lookup = env_of(&[
            (CONFIG_JSON_ENV, r#"{"refresh": {"max_in_flight": 2}}"#),
            (SERVER_URL_ENV, "api.example.test"),
        ]);
        let load = ConfigLoader::new().load_with(lookup).unwrap();

        assert_eq!(load.source, ConfigSource::EnvInline);
        assert_eq!(load.config.refresh.max_in_flight, 2);
        assert_eq!(load.config.server.base_url, "http://api.example.test");
    }

    #[test]
    fn path_env_takes_precedence_over_inline_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        fs::write(&path, "[search]\nwide_debounce = \"250ms\"\n").unwrap();

        let lookup = env_of(&[
            (CONFIG_PATH_ENV, path.to_str().unwrap()),
            (CONFIG_JSON_ENV, r#"{"search": {"wide_debounce": 50}}"#),
        ]);
        let load = ConfigLoader::new().load_with(lookup).unwrap();

        assert_eq!(load.source, ConfigSource::EnvPath(path));
        assert_eq!(load.config.search.wide_debounce, Duration::from_millis(250));
    }

    #[test]
    fn explicit_path_beats_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        fs::write(&path, r#"{"refresh": {"favorites_base_delay": "40ms"}}"#)
            .unwrap();

        let lookup = env_of(&[(CONFIG_JSON_ENV, r#"{"refresh": {}}"#)]);
        let load = ConfigLoader::new()
            .with_path(&path)
            .load_with(lookup)
            .unwrap();

        assert_eq!(load.source, ConfigSource::File(path));
        assert_eq!(
            load.config.refresh.favorites_base_delay,
            Duration::from_millis(40)
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let lookup = env_of(&[(CONFIG_PATH_ENV, "/nonexistent/deeplibby.toml")]);
        let err = ConfigLoader::new().load_with(lookup).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }

    #[test]
    fn guard_rails_reject_zero_permits() {
        let lookup =
            env_of(&[(CONFIG_JSON_ENV, r#"{"refresh": {"max_in_flight": 0}}"#)]);
        let err = ConfigLoader::new().load_with(lookup).unwrap_err();
        assert!(matches!(err, ConfigLoadError::GuardRail(_)));
    }

    #[test]
    fn extensionless_file_accepts_either_format() {
        let toml = ClientConfig::parse_from_str(
            "[server]\nbase_url = \"http://a\"\n",
            "inline",
        )
        .unwrap();
        let json = ClientConfig::parse_from_str(
            r#"{"server": {"base_url": "http://a"}}"#,
            "inline",
        )
        .unwrap();
        assert_eq!(toml, json);
        assert!(ClientConfig::parse_from_str("nope = [", "inline").is_err());
    }
}

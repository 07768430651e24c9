use std::time::Duration;

use thiserror::Error;

use crate::models::ClientConfig;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("refresh.max_in_flight must allow at least one request")]
    NoRefreshPermits,
    #[error("search.compact_max_width must be greater than zero")]
    ZeroWidthThreshold,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

const NOISY_IN_FLIGHT: usize = 32;

pub fn apply_guard_rails(
    config: &ClientConfig,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let durations: [(&'static str, Duration); 6] = [
        ("server.timeout", config.server.timeout),
        ("upstream.timeout", config.upstream.timeout),
        ("search.compact_debounce", config.search.compact_debounce),
        ("search.wide_debounce", config.search.wide_debounce),
        (
            "refresh.favorites_base_delay",
            config.refresh.favorites_base_delay,
        ),
        (
            "refresh.non_favorites_base_delay",
            config.refresh.non_favorites_base_delay,
        ),
    ];
    if let Some(&(field, _)) =
        durations.iter().find(|(_, value)| value.is_zero())
    {
        return Err(ConfigGuardRailError::ZeroDuration { field });
    }

    if config.refresh.max_in_flight == 0 {
        return Err(ConfigGuardRailError::NoRefreshPermits);
    }
    if config.search.compact_max_width == 0 {
        return Err(ConfigGuardRailError::ZeroWidthThreshold);
    }

    if config.refresh.max_in_flight > NOISY_IN_FLIGHT {
        warnings.push_with_hint(
            format!(
                "refresh.max_in_flight = {} may trip upstream rate limits",
                config.refresh.max_in_flight
            ),
            format!("keep it at or below {NOISY_IN_FLIGHT}"),
        );
    }
    if config.search.compact_debounce < config.search.wide_debounce {
        warnings.push(
            "search.compact_debounce is shorter than search.wide_debounce",
        );
    }
    if config.upstream.base_url.starts_with("http://") {
        warnings.push("upstream.base_url is not using https");
    }
    if !config.refresh.cancel_on_teardown {
        warnings.push_with_hint(
            "refresh.cancel_on_teardown is disabled",
            "refreshes for a dismissed snapshot will keep hitting the upstream",
        );
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_without_warnings() {
        let warnings = apply_guard_rails(&ClientConfig::default()).unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings.items);
    }

    #[test]
    fn zero_delay_is_rejected() {
        let mut config = ClientConfig::default();
        config.refresh.favorites_base_delay = Duration::ZERO;
        let err = apply_guard_rails(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigGuardRailError::ZeroDuration {
                field: "refresh.favorites_base_delay"
            }
        ));
    }

    #[test]
    fn zero_permits_are_rejected() {
        let mut config = ClientConfig::default();
        config.refresh.max_in_flight = 0;
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::NoRefreshPermits)
        ));
    }

    #[test]
    fn plain_http_upstream_warns() {
        let mut config = ClientConfig::default();
        config.upstream.base_url = "http://127.0.0.1:9000".into();
        let warnings = apply_guard_rails(&config).unwrap();
        assert_eq!(warnings.items.len(), 1);
    }
}

//! Serde adapter for human-readable durations (`"700ms"`, `"2s"`).
//!
//! Bare integers are still accepted and read as milliseconds so inline JSON
//! overrides stay terse.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer, de};

pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Millis(ms) => Ok(Duration::from_millis(ms)),
        Raw::Text(text) => humantime::parse_duration(text.trim())
            .map_err(|err| de::Error::custom(format!("{text:?}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        delay: Duration,
    }

    #[test]
    fn accepts_text_and_millis() {
        let text: Wrapper = serde_json::from_str(r#"{"delay":"1s 500ms"}"#).unwrap();
        assert_eq!(text.delay, Duration::from_millis(1_500));

        let millis: Wrapper = serde_json::from_str(r#"{"delay":250}"#).unwrap();
        assert_eq!(millis.delay, Duration::from_millis(250));

        assert!(serde_json::from_str::<Wrapper>(r#"{"delay":"soon"}"#).is_err());
    }

    #[test]
    fn writes_humantime_strings() {
        let wrapper = Wrapper {
            delay: Duration::from_millis(700),
        };
        assert_eq!(serde_json::to_string(&wrapper).unwrap(), r#"{"delay":"700ms"}"#);
    }
}

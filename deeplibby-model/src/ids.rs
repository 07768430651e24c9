use crate::error::{ModelError, Result};

fn is_path_safe(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Opaque library identifier (the current favorites scheme).
///
/// Library ids are embedded in upstream URL paths, so construction through
/// [`LibraryId::parse`] rejects anything that is not a plain slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LibraryId(String);

impl LibraryId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if is_path_safe(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ModelError::InvalidLibraryId(raw.as_ref().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LibraryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for LibraryId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for LibraryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric library identifier from the legacy favorites scheme. Several
/// libraries (consortium members) may share one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LegacyLibraryId(pub i64);

impl std::fmt::Display for LegacyLibraryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media identifier.
///
/// The DeepLibby backend encodes ids as JSON numbers while the upstream
/// availability service uses strings; both decode to the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaId(String);

impl MediaId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if is_path_safe(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ModelError::InvalidMediaId(raw.as_ref().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for MediaId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl std::str::FromStr for MediaId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for LibraryId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        LibraryId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MediaId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MediaId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(MediaId::from(value)),
            Raw::Text(text) => {
                MediaId::parse(&text).map_err(serde::de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_id_rejects_path_segments() {
        assert!(LibraryId::parse("lapl").is_ok());
        assert!(LibraryId::parse(" nypl ").is_ok());
        assert!(LibraryId::parse("").is_err());
        assert!(LibraryId::parse("../admin").is_err());
    }

    #[test]
    fn media_id_from_number_matches_text() {
        assert_eq!(MediaId::from(9_110_731), MediaId::parse("9110731").unwrap());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn media_id_decodes_numbers_and_strings() {
        let from_number: MediaId = serde_json::from_str("123").unwrap();
        let from_text: MediaId = serde_json::from_str("\"123\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"123\"");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn decoded_library_id_is_checked_like_parse() {
        let ok: LibraryId = serde_json::from_str("\"lapl\"").unwrap();
        assert_eq!(ok.as_str(), "lapl");
        assert!(serde_json::from_str::<LibraryId>("\"../admin\"").is_err());
        assert!(serde_json::from_str::<LibraryId>("\"\"").is_err());
        assert!(serde_json::from_str::<Vec<LibraryId>>(r#"["ok", "a/b"]"#).is_err());
    }
}

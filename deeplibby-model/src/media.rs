use crate::ids::MediaId;

/// Author, narrator, editor and so on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Creator {
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: String,
}

impl Creator {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// A media item as returned by the search endpoint.
///
/// The same shape heads the availability and comparison payloads, so the
/// descriptive fields the search list never shows (`subtitle`,
/// `description`, `publisher`) are optional here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SearchResult {
    pub id: MediaId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub subtitle: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub description: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub publisher: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub creators: Vec<Creator>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub languages: Vec<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub formats: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cover_url: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub series_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub series_read_order: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub library_count: u32,
}

impl SearchResult {
    /// Minimal result, mostly useful for tests and fixtures.
    pub fn new(id: MediaId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            subtitle: String::new(),
            description: String::new(),
            publisher: String::new(),
            creators: Vec::new(),
            languages: Vec::new(),
            formats: Vec::new(),
            cover_url: String::new(),
            series_name: String::new(),
            series_read_order: 0,
            library_count: 0,
        }
    }

    pub fn with_creators(mut self, creators: Vec<Creator>) -> Self {
        self.creators = creators;
        self
    }

    pub fn with_series(
        mut self,
        name: impl Into<String>,
        read_order: u32,
    ) -> Self {
        self.series_name = name.into();
        self.series_read_order = read_order;
        self
    }

    pub fn with_library_count(mut self, library_count: u32) -> Self {
        self.library_count = library_count;
        self
    }

    /// "Name (role), Name (role)" as shown in result lists.
    pub fn creator_line(&self) -> String {
        self.creators
            .iter()
            .map(|creator| format!("{} ({})", creator.name, creator.role))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// "#3 in Series" when the item belongs to a series.
    pub fn series_label(&self) -> Option<String> {
        (!self.series_name.is_empty()).then(|| {
            format!("#{} in {}", self.series_read_order, self.series_name)
        })
    }
}

/// Body of `GET /api/search`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResponse {
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::nullable::or_default")
    )]
    pub results: Vec<SearchResult>,
}

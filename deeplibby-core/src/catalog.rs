//! Library directory: the full catalog annotated with favorites.

use std::sync::Arc;

use deeplibby_model::{Library, LibraryId};
use tracing::debug;

use crate::api::LibraryCatalog;
use crate::error::FavoritesError;
use crate::favorites::FavoritesRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub library: Library,
    pub favorite: bool,
}

#[derive(Debug)]
pub struct LibraryDirectory {
    catalog: Arc<dyn LibraryCatalog>,
    favorites: Arc<FavoritesRepository>,
}

impl LibraryDirectory {
    pub fn new(
        catalog: Arc<dyn LibraryCatalog>,
        favorites: Arc<FavoritesRepository>,
    ) -> Self {
        Self { catalog, favorites }
    }

    /// Every library, sorted by name, with an optional case-insensitive
    /// name filter.
    pub async fn entries(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, FavoritesError> {
        let libraries = self
            .catalog
            .fetch_libraries()
            .await
            .map_err(FavoritesError::Catalog)?;
        let favorites = self.favorites.load().await?;
        let needle = filter.map(str::to_lowercase);

        let mut entries: Vec<CatalogEntry> = libraries
            .into_iter()
            .filter(|library| match &needle {
                Some(needle) => library.name.to_lowercase().contains(needle),
                None => true,
            })
            .map(|library| CatalogEntry {
                favorite: favorites.contains(&library.id),
                library,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.library
                .name
                .to_lowercase()
                .cmp(&b.library.name.to_lowercase())
                .then_with(|| a.library.id.cmp(&b.library.id))
        });
        debug!(count = entries.len(), "listed libraries");
        Ok(entries)
    }

    /// Favorite libraries in favorites order. Ids the catalog no longer
    /// knows are returned as bare entries named after the id.
    pub async fn favorite_libraries(
        &self,
    ) -> Result<Vec<Library>, FavoritesError> {
        let favorites = self.favorites.load().await?;
        if favorites.is_empty() {
            return Ok(Vec::new());
        }
        let libraries = self
            .catalog
            .fetch_libraries()
            .await
            .map_err(FavoritesError::Catalog)?;

        Ok(favorites
            .iter()
            .map(|id| {
                libraries
                    .iter()
                    .find(|library| &library.id == id)
                    .cloned()
                    .unwrap_or_else(|| bare_library(id))
            })
            .collect())
    }
}

fn bare_library(id: &LibraryId) -> Library {
    Library::new(id.clone(), Default::default(), id.as_str())
}

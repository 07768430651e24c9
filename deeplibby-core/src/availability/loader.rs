use std::sync::Arc;

use deeplibby_model::{AvailabilitySnapshot, MediaId};
use tracing::{debug, warn};

use crate::api::ApiService;
use crate::error::LoadError;
use crate::favorites::{FavoriteSet, FavoritesRepository};

/// Fetches the availability snapshot for a selected media item and tags
/// each row with the user's favorites.
#[derive(Debug)]
pub struct AvailabilitySnapshotLoader {
    api: Arc<dyn ApiService>,
    favorites: Arc<FavoritesRepository>,
}

impl AvailabilitySnapshotLoader {
    pub fn new(
        api: Arc<dyn ApiService>,
        favorites: Arc<FavoritesRepository>,
    ) -> Self {
        Self { api, favorites }
    }

    /// Nothing partial is returned: a failed fetch is a [`LoadError`]. An
    /// unreadable favorites store only costs the favorite flags.
    pub async fn load(
        &self,
        media_id: &MediaId,
    ) -> Result<AvailabilitySnapshot, LoadError> {
        let (snapshot, favorites) = futures::join!(
            self.api.availability(media_id),
            self.favorites.load()
        );
        let snapshot = snapshot?;
        let favorites = favorites.unwrap_or_else(|err| {
            warn!(error = %err, "favorites unavailable, loading without them");
            FavoriteSet::new()
        });

        let snapshot = annotate(snapshot, &favorites);
        debug!(
            media = %media_id,
            rows = snapshot.rows.len(),
            favorites = snapshot.rows.iter().filter(|row| row.favorite).count(),
            "loaded availability snapshot"
        );
        Ok(snapshot)
    }
}

/// Set `favorite` from membership and reset `fresh` on every row.
pub fn annotate(
    mut snapshot: AvailabilitySnapshot,
    favorites: &FavoriteSet,
) -> AvailabilitySnapshot {
    for row in &mut snapshot.rows {
        row.favorite = favorites.contains(&row.library.id);
        row.fresh = false;
    }
    snapshot
}

//! Checks a list of titles (typically a want-to-read shelf) against every
//! favorite library in one pass per library.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use deeplibby_model::{LibraryId, MediaId, SearchResult};
use tracing::{debug, info, warn};

use crate::api::UpstreamAvailabilityService;
use crate::error::FavoritesError;
use crate::favorites::FavoritesRepository;
use crate::time::TimeProvider;

/// Live counts for one title at one favorite library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryAvailability {
    pub library: LibraryId,
    pub owned_count: u32,
    pub available_count: u32,
    pub holds_count: u32,
    pub estimated_wait_days: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    AvailableNow { library: LibraryId, copies: u32 },
    Waitlist { library: LibraryId, wait_days: i32 },
    NotFound,
}

#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub media: SearchResult,
    /// One entry per favorite library that owns the title.
    pub holdings: Vec<LibraryAvailability>,
}

impl ScanSummary {
    /// Favorite libraries with a copy on the shelf right now.
    pub fn available_now(&self) -> usize {
        self.holdings
            .iter()
            .filter(|holding| holding.available_count > 0)
            .count()
    }

    /// Most copies available wins; otherwise the shortest wait. Ties go to
    /// the earlier favorite.
    pub fn best(&self) -> Option<&LibraryAvailability> {
        let mut best: Option<&LibraryAvailability> = None;
        for holding in &self.holdings {
            if holding.available_count > 0
                && best.is_none_or(|b| holding.available_count > b.available_count)
            {
                best = Some(holding);
            }
        }
        best.or_else(|| {
            self.holdings
                .iter()
                .min_by_key(|holding| holding.estimated_wait_days)
        })
    }

    pub fn status(&self) -> ScanStatus {
        match self.best() {
            Some(best) if best.available_count > 0 => ScanStatus::AvailableNow {
                library: best.library.clone(),
                copies: best.available_count,
            },
            Some(best) => ScanStatus::Waitlist {
                library: best.library.clone(),
                wait_days: best.estimated_wait_days,
            },
            None => ScanStatus::NotFound,
        }
    }
}

#[derive(Debug)]
pub struct FavoritesAvailabilityScan {
    upstream: Arc<dyn UpstreamAvailabilityService>,
    favorites: Arc<FavoritesRepository>,
    time: Arc<dyn TimeProvider>,
    stagger: Duration,
}

impl FavoritesAvailabilityScan {
    pub fn new(
        upstream: Arc<dyn UpstreamAvailabilityService>,
        favorites: Arc<FavoritesRepository>,
        time: Arc<dyn TimeProvider>,
        stagger: Duration,
    ) -> Self {
        Self {
            upstream,
            favorites,
            time,
            stagger,
        }
    }

    /// Query each favorite library once with every media id, one library
    /// after another, `stagger` apart. Libraries that fail are skipped.
    pub async fn scan(
        &self,
        media: Vec<SearchResult>,
    ) -> Result<Vec<ScanSummary>, FavoritesError> {
        let favorites = self.favorites.load().await?;
        let ids: Vec<MediaId> = media.iter().map(|m| m.id.clone()).collect();
        let mut holdings: HashMap<MediaId, Vec<LibraryAvailability>> =
            HashMap::new();

        if ids.is_empty() || favorites.is_empty() {
            debug!(
                titles = ids.len(),
                favorites = favorites.len(),
                "nothing to scan"
            );
        } else {
            for library in favorites.iter() {
                self.time.sleep(self.stagger).await;
                let response =
                    match self.upstream.fetch_availability(library, &ids).await {
                        Ok(response) => response,
                        Err(err) => {
                            warn!(library = %library, error = %err, "skipping library in scan");
                            continue;
                        }
                    };

                for item in response.items.iter().flatten() {
                    let Some(media_id) = &item.id else { continue };
                    if item.owned_copies == 0 || !ids.contains(media_id) {
                        continue;
                    }
                    holdings.entry(media_id.clone()).or_default().push(
                        LibraryAvailability {
                            library: library.clone(),
                            owned_count: item.owned_copies,
                            available_count: item.available_copies,
                            holds_count: item.holds_count,
                            estimated_wait_days: item.normalized_wait_days(),
                        },
                    );
                }
            }
        }

        let summaries: Vec<ScanSummary> = media
            .into_iter()
            .map(|media| ScanSummary {
                holdings: holdings.remove(&media.id).unwrap_or_default(),
                media,
            })
            .collect();
        info!(
            titles = summaries.len(),
            available = summaries.iter().filter(|s| s.available_now() > 0).count(),
            "favorites scan finished"
        );
        Ok(summaries)
    }
}

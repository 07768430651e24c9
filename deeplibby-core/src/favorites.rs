//! Favorite libraries, persisted through a [`KeyValueStore`].
//!
//! Two schemes exist side by side in the store: the legacy `favorites` key
//! holds numeric ids (the `websiteId` of a library, shared by consortium
//! members) and the current `favoriteIds` key holds opaque library ids.
//! The first `load` that finds the current set empty and the legacy set
//! populated resolves the legacy ids through the library catalog and writes
//! the result under the current key. The legacy key is left untouched.

use std::sync::Arc;

use deeplibby_config::LegacyAliasPolicy;
use deeplibby_model::{LegacyLibraryId, Library, LibraryId};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::api::LibraryCatalog;
use crate::error::FavoritesError;
use crate::store::KeyValueStore;

pub const LEGACY_FAVORITES_KEY: &str = "favorites";
pub const FAVORITE_IDS_KEY: &str = "favoriteIds";

pub type FavoritesResult<T> = Result<T, FavoritesError>;

/// Ordered set of favorite library ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    ids: Vec<LibraryId>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &LibraryId) -> bool {
        self.ids.contains(id)
    }

    /// Returns `false` when `id` was already present.
    pub fn insert(&mut self, id: LibraryId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Returns `false` when `id` was absent.
    pub fn remove(&mut self, id: &LibraryId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &LibraryId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<LibraryId> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = LibraryId>>(iter: I) -> Self {
        let mut set = FavoriteSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// What an explicit migration did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Ids written under the current key.
    pub migrated: Vec<LibraryId>,
    /// Legacy ids no catalog entry carried.
    pub unresolved: Vec<LegacyLibraryId>,
    /// The current set was already populated, nothing was done.
    pub skipped: bool,
}

#[derive(Debug)]
pub struct FavoritesRepository {
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn LibraryCatalog>,
    alias_policy: LegacyAliasPolicy,
    migration: OnceCell<()>,
}

impl FavoritesRepository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn LibraryCatalog>,
    ) -> Self {
        Self {
            store,
            catalog,
            alias_policy: LegacyAliasPolicy::default(),
            migration: OnceCell::new(),
        }
    }

    pub fn with_alias_policy(mut self, policy: LegacyAliasPolicy) -> Self {
        self.alias_policy = policy;
        self
    }

    /// Current favorites, migrating legacy ids on the first call that needs
    /// it. A catalog failure during migration is logged and yields an empty
    /// set; migration is not retried for the lifetime of this repository.
    /// Concurrent callers wait for a migration already running.
    pub async fn load(&self) -> FavoritesResult<FavoriteSet> {
        let current = self.read_current()?;
        if !current.is_empty() {
            return Ok(current);
        }

        self.migration
            .get_or_try_init(|| async {
                match self.run_migration().await {
                    Ok(_) => Ok(()),
                    Err(FavoritesError::Catalog(err)) => {
                        warn!(error = %err, "skipping legacy favorites migration");
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            })
            .await?;
        self.read_current()
    }

    /// Run the legacy migration now, regardless of earlier attempts.
    pub async fn migrate(&self) -> FavoritesResult<MigrationReport> {
        // Loads that start after this no longer migrate on their own.
        let _ = self.migration.set(());
        if !self.read_current()?.is_empty() {
            return Ok(MigrationReport {
                skipped: true,
                ..MigrationReport::default()
            });
        }
        self.run_migration().await
    }

    pub async fn add(&self, id: LibraryId) -> FavoritesResult<FavoriteSet> {
        let mut favorites = self.load().await?;
        if favorites.insert(id.clone()) {
            self.write_current(&favorites)?;
            debug!(library = %id, "added favorite");
        }
        Ok(favorites)
    }

    pub async fn remove(&self, id: &LibraryId) -> FavoritesResult<FavoriteSet> {
        let mut favorites = self.load().await?;
        if favorites.remove(id) {
            self.write_current(&favorites)?;
            debug!(library = %id, "removed favorite");
        }
        Ok(favorites)
    }

    async fn run_migration(&self) -> FavoritesResult<MigrationReport> {
        let legacy = self.read_legacy()?;
        if legacy.is_empty() {
            return Ok(MigrationReport::default());
        }

        let catalog = self
            .catalog
            .fetch_libraries()
            .await
            .map_err(FavoritesError::Catalog)?;
        let report = resolve_legacy(&legacy, &catalog, self.alias_policy);

        let favorites: FavoriteSet =
            report.migrated.iter().cloned().collect();
        self.write_current(&favorites)?;
        info!(
            migrated = report.migrated.len(),
            unresolved = report.unresolved.len(),
            "migrated legacy favorites"
        );
        Ok(report)
    }

    fn read_current(&self) -> FavoritesResult<FavoriteSet> {
        let Some(raw) = self.store.get(FAVORITE_IDS_KEY)? else {
            return Ok(FavoriteSet::new());
        };
        let ids: Option<Vec<LibraryId>> =
            serde_json::from_str(&raw).map_err(|source| {
                FavoritesError::Corrupt {
                    key: FAVORITE_IDS_KEY,
                    source,
                }
            })?;
        Ok(ids.unwrap_or_default().into_iter().collect())
    }

    fn read_legacy(&self) -> FavoritesResult<Vec<LegacyLibraryId>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawLegacyId {
            Number(i64),
            Text(String),
        }

        let Some(raw) = self.store.get(LEGACY_FAVORITES_KEY)? else {
            return Ok(Vec::new());
        };
        let entries: Option<Vec<RawLegacyId>> = serde_json::from_str(&raw)
            .map_err(|source| FavoritesError::Corrupt {
                key: LEGACY_FAVORITES_KEY,
                source,
            })?;

        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match entry {
                RawLegacyId::Number(value) => Some(LegacyLibraryId(value)),
                RawLegacyId::Text(text) => {
                    text.trim().parse().ok().map(LegacyLibraryId)
                }
            })
            .collect())
    }

    fn write_current(&self, favorites: &FavoriteSet) -> FavoritesResult<()> {
        let ids: Vec<&str> = favorites.iter().map(LibraryId::as_str).collect();
        let raw = serde_json::to_string(&ids).map_err(|source| {
            FavoritesError::Corrupt {
                key: FAVORITE_IDS_KEY,
                source,
            }
        })?;
        self.store.set(FAVORITE_IDS_KEY, raw)?;
        Ok(())
    }
}

/// Map legacy ids onto catalog entries. Output keeps legacy order, then
/// catalog order within one legacy id, and never repeats an id.
pub fn resolve_legacy(
    legacy: &[LegacyLibraryId],
    catalog: &[Library],
    policy: LegacyAliasPolicy,
) -> MigrationReport {
    let mut report = MigrationReport::default();
    for legacy_id in legacy {
        let mut matches = catalog
            .iter()
            .filter(|library| library.legacy_id == *legacy_id)
            .peekable();
        if matches.peek().is_none() {
            report.unresolved.push(*legacy_id);
            continue;
        }

        let take = match policy {
            LegacyAliasPolicy::All => usize::MAX,
            LegacyAliasPolicy::First => 1,
        };
        for library in matches.take(take) {
            if !report.migrated.contains(&library.id) {
                report.migrated.push(library.id.clone());
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{StubCatalog, library, settle};

    fn repository(
        store: Arc<MemoryStore>,
        catalog: Arc<StubCatalog>,
    ) -> FavoritesRepository {
        FavoritesRepository::new(store, catalog)
    }

    fn catalog() -> Arc<StubCatalog> {
        Arc::new(StubCatalog::new(vec![
            library("lapl", 12, "Los Angeles Public Library"),
            library("ocpl", 40, "Orange County Library"),
            library("metro-a", 77, "Metro Consortium A"),
            library("metro-b", 77, "Metro Consortium B"),
        ]))
    }

    fn stored_ids(store: &MemoryStore) -> Option<String> {
        store.get(FAVORITE_IDS_KEY).unwrap()
    }

    #[tokio::test]
    async fn migrates_legacy_ids_including_aliases() {
        let store =
            Arc::new(MemoryStore::with_entries([("favorites", "[77, 12, 999]")]));
        let catalog = catalog();
        let repo = repository(store.clone(), catalog.clone());

        let favorites = repo.load().await.unwrap();
        let ids: Vec<&str> = favorites.iter().map(LibraryId::as_str).collect();
        assert_eq!(ids, vec!["metro-a", "metro-b", "lapl"]);
        assert_eq!(
            stored_ids(&store).as_deref(),
            Some(r#"["metro-a","metro-b","lapl"]"#)
        );
        // Legacy key is kept.
        assert!(store.get(LEGACY_FAVORITES_KEY).unwrap().is_some());
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn first_alias_policy_keeps_one_library() {
        let store = Arc::new(MemoryStore::with_entries([("favorites", "[77]")]));
        let repo = repository(store, catalog())
            .with_alias_policy(LegacyAliasPolicy::First);

        let favorites = repo.load().await.unwrap();
        let ids: Vec<&str> = favorites.iter().map(LibraryId::as_str).collect();
        assert_eq!(ids, vec!["metro-a"]);
    }

    #[tokio::test]
    async fn migration_is_noop_when_current_set_exists() {
        let store = Arc::new(MemoryStore::with_entries([
            ("favorites", "[12, 40]"),
            ("favoriteIds", r#"["ocpl"]"#),
        ]));
        let catalog = catalog();
        let repo = repository(store.clone(), catalog.clone());

        let favorites = repo.load().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert!(favorites.contains(&LibraryId::parse("ocpl").unwrap()));
        assert_eq!(catalog.calls(), 0);

        let report = repo.migrate().await.unwrap();
        assert!(report.skipped);
        assert_eq!(stored_ids(&store).as_deref(), Some(r#"["ocpl"]"#));
    }

    #[tokio::test]
    async fn catalog_failure_skips_migration_for_session() {
        let store = Arc::new(MemoryStore::with_entries([("favorites", "[12]")]));
        let catalog = Arc::new(StubCatalog::failing());
        let repo = repository(store.clone(), catalog.clone());

        assert!(repo.load().await.unwrap().is_empty());
        assert!(repo.load().await.unwrap().is_empty());
        assert_eq!(catalog.calls(), 1);
        assert_eq!(stored_ids(&store), None);
    }

    #[tokio::test]
    async fn add_and_remove_are_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let repo = repository(store.clone(), catalog());
        let lapl = LibraryId::parse("lapl").unwrap();

        repo.add(lapl.clone()).await.unwrap();
        let favorites = repo.add(lapl.clone()).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(stored_ids(&store).as_deref(), Some(r#"["lapl"]"#));

        repo.remove(&lapl).await.unwrap();
        let favorites = repo.remove(&lapl).await.unwrap();
        assert!(favorites.is_empty());
        assert_eq!(stored_ids(&store).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn duplicate_stored_ids_collapse() {
        let store = Arc::new(MemoryStore::with_entries([(
            "favoriteIds",
            r#"["lapl", "lapl", "ocpl"]"#,
        )]));
        let favorites = repository(store, catalog()).load().await.unwrap();
        assert_eq!(favorites.len(), 2);
    }

    #[tokio::test]
    async fn corrupt_current_set_is_an_error() {
        let store =
            Arc::new(MemoryStore::with_entries([("favoriteIds", "{not json")]));
        let err = repository(store, catalog()).load().await.unwrap_err();
        assert!(matches!(err, FavoritesError::Corrupt { key: "favoriteIds", .. }));
    }

    #[test]
    fn resolve_reports_unknown_legacy_ids() {
        let catalog = vec![library("lapl", 12, "LAPL")];
        let report = resolve_legacy(
            &[LegacyLibraryId(12), LegacyLibraryId(5)],
            &catalog,
            LegacyAliasPolicy::All,
        );
        assert_eq!(report.migrated, vec![LibraryId::parse("lapl").unwrap()]);
        assert_eq!(report.unresolved, vec![LegacyLibraryId(5)]);
    }

    #[tokio::test]
    async fn concurrent_load_waits_for_running_migration() {
        let store = Arc::new(MemoryStore::with_entries([("favorites", "[12]")]));
        let catalog = catalog();
        let gate = catalog.gate();
        let repo = Arc::new(repository(store.clone(), catalog.clone()));

        let first = tokio::spawn({
            let repo = Arc::clone(&repo);
            async move { repo.load().await }
        });
        settle().await;
        assert_eq!(catalog.calls(), 1);

        let second = tokio::spawn({
            let repo = Arc::clone(&repo);
            async move { repo.load().await }
        });
        settle().await;
        assert!(!second.is_finished());

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        let lapl = LibraryId::parse("lapl").unwrap();
        assert!(first.contains(&lapl));
        assert_eq!(second, first);
        assert_eq!(catalog.calls(), 1);
        assert_eq!(stored_ids(&store).as_deref(), Some(r#"["lapl"]"#));
    }
}

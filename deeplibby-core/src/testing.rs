//! Hand-written stubs for the HTTP collaborators plus fixture builders.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use deeplibby_model::{
    AvailabilityRow, AvailabilitySnapshot, DiffEntry, HoldingCounts,
    IntersectEntry, LegacyLibraryId, Library, LibraryHolding, LibraryId,
    MediaId, SearchResult, UniqueResponse, UpstreamAvailabilityItem,
    UpstreamAvailabilityResponse,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::api::{
    ApiResult, ApiService, LibraryCatalog, UpstreamAvailabilityService,
};
use crate::error::ApiError;

/// Let spawned tasks on the current-thread test runtime make progress.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: StatusCode::NOT_FOUND,
        body: "no stub response".to_string(),
    }
}

pub fn library(id: &str, legacy: i64, name: &str) -> Library {
    Library::new(
        LibraryId::parse(id).expect("fixture library id"),
        LegacyLibraryId(legacy),
        name,
    )
}

pub fn media(id: u64, title: &str, library_count: u32) -> SearchResult {
    SearchResult::new(MediaId::from(id), title).with_library_count(library_count)
}

/// Snapshot with one row per `(library, available, wait)`, five copies owned
/// at each.
pub fn snapshot(media_id: u64, rows: &[(&str, u32, i32)]) -> AvailabilitySnapshot {
    AvailabilitySnapshot::new(
        media(media_id, "Fixture", rows.len() as u32),
        rows.iter()
            .map(|(id, available, wait)| {
                AvailabilityRow::new(library(id, 0, id))
                    .with_counts(5, *available, 0, *wait)
            })
            .collect(),
    )
}

pub fn upstream_item(
    media_id: u64,
    owned: u32,
    available: u32,
    holds: u32,
    wait: Option<i32>,
) -> UpstreamAvailabilityItem {
    UpstreamAvailabilityItem {
        id: Some(MediaId::from(media_id)),
        owned_copies: owned,
        available_copies: available,
        holds_count: holds,
        estimated_wait_days: wait,
    }
}

pub fn upstream_response(
    media_id: u64,
    owned: u32,
    available: u32,
    holds: u32,
    wait: Option<i32>,
) -> UpstreamAvailabilityResponse {
    upstream_items(&[(media_id, owned, available, holds, wait)])
}

pub fn upstream_items(
    items: &[(u64, u32, u32, u32, Option<i32>)],
) -> UpstreamAvailabilityResponse {
    UpstreamAvailabilityResponse {
        items: items
            .iter()
            .map(|&(id, owned, available, holds, wait)| {
                Some(upstream_item(id, owned, available, holds, wait))
            })
            .collect(),
    }
}

pub fn diff_entry(media_id: u64, title: &str, library_id: &str) -> DiffEntry {
    DiffEntry {
        media: media(media_id, title, 1),
        holding: LibraryHolding {
            library: library(library_id, 0, library_id),
            counts: HoldingCounts {
                owned_count: 1,
                ..HoldingCounts::default()
            },
        },
    }
}

#[derive(Debug, Default)]
pub struct StubCatalog {
    libraries: Vec<Library>,
    failing: bool,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl StubCatalog {
    pub fn new(libraries: Vec<Library>) -> Self {
        Self {
            libraries,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hold every fetch until the returned gate is notified.
    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl LibraryCatalog for StubCatalog {
    async fn fetch_libraries(&self) -> ApiResult<Vec<Library>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing {
            return Err(ApiError::Transport("catalog offline".to_string()));
        }
        Ok(self.libraries.clone())
    }
}

#[derive(Debug, Default)]
struct StubApiState {
    search: HashMap<String, ApiResult<Vec<SearchResult>>>,
    search_gates: HashMap<String, Arc<Notify>>,
    search_calls: Vec<String>,
    availability: Option<ApiResult<AvailabilitySnapshot>>,
    diff: HashMap<(String, String), Vec<DiffEntry>>,
    diff_gate: Option<Arc<Notify>>,
    diff_calls: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct StubApi {
    state: Mutex<StubApiState>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search(&self, query: &str, results: Vec<SearchResult>) {
        self.state.lock().search.insert(query.to_string(), Ok(results));
    }

    pub fn fail_search(&self, query: &str, error: ApiError) {
        self.state.lock().search.insert(query.to_string(), Err(error));
    }

    /// Hold the response for `query` until the returned gate is notified.
    pub fn gate_search(&self, query: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .search_gates
            .insert(query.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.state.lock().search_calls.clone()
    }

    pub fn set_availability(&self, snapshot: AvailabilitySnapshot) {
        self.state.lock().availability = Some(Ok(snapshot));
    }

    pub fn fail_availability(&self, error: ApiError) {
        self.state.lock().availability = Some(Err(error));
    }

    pub fn set_diff(&self, left: &str, right: &str, entries: Vec<DiffEntry>) {
        self.state
            .lock()
            .diff
            .insert((left.to_string(), right.to_string()), entries);
    }

    pub fn gate_diff(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().diff_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn diff_calls(&self) -> Vec<(String, String)> {
        self.state.lock().diff_calls.clone()
    }
}

#[async_trait]
impl ApiService for StubApi {
    async fn search(&self, query: &str) -> ApiResult<Vec<SearchResult>> {
        let gate = {
            let mut state = self.state.lock();
            state.search_calls.push(query.to_string());
            state.search_gates.get(query).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state
            .lock()
            .search
            .get(query)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn availability(
        &self,
        _media_id: &MediaId,
    ) -> ApiResult<AvailabilitySnapshot> {
        self.state
            .lock()
            .availability
            .clone()
            .unwrap_or_else(|| Err(not_found()))
    }

    async fn diff(
        &self,
        left: &LibraryId,
        right: &LibraryId,
    ) -> ApiResult<Vec<DiffEntry>> {
        let key = (left.to_string(), right.to_string());
        let gate = {
            let mut state = self.state.lock();
            state.diff_calls.push(key.clone());
            state.diff_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.state.lock().diff.get(&key).cloned().unwrap_or_default())
    }

    async fn intersect(
        &self,
        _left: &LibraryId,
        _right: &LibraryId,
    ) -> ApiResult<Vec<IntersectEntry>> {
        Ok(Vec::new())
    }

    async fn unique(&self, _library: &LibraryId) -> ApiResult<UniqueResponse> {
        Err(not_found())
    }

    async fn search_hardcover(
        &self,
        _username: &str,
        _additional_filters: Option<&str>,
    ) -> ApiResult<Vec<SearchResult>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
struct StubUpstreamState {
    responses: HashMap<String, ApiResult<UpstreamAvailabilityResponse>>,
    gates: HashMap<String, Arc<Notify>>,
    calls: Vec<(String, Vec<MediaId>)>,
}

#[derive(Debug, Default)]
pub struct StubUpstream {
    state: Mutex<StubUpstreamState>,
}

impl StubUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, library: &str, response: UpstreamAvailabilityResponse) {
        self.state
            .lock()
            .responses
            .insert(library.to_string(), Ok(response));
    }

    pub fn fail(&self, library: &str, error: ApiError) {
        self.state
            .lock()
            .responses
            .insert(library.to_string(), Err(error));
    }

    pub fn gate(&self, library: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .gates
            .insert(library.to_string(), Arc::clone(&gate));
        gate
    }

    /// Libraries in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|(library, _)| library.clone())
            .collect()
    }

    pub fn requested_ids(&self, library: &str) -> Vec<MediaId> {
        self.state
            .lock()
            .calls
            .iter()
            .find(|(called, _)| called == library)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UpstreamAvailabilityService for StubUpstream {
    async fn fetch_availability(
        &self,
        library: &LibraryId,
        media_ids: &[MediaId],
    ) -> ApiResult<UpstreamAvailabilityResponse> {
        let gate = {
            let mut state = self.state.lock();
            state
                .calls
                .push((library.to_string(), media_ids.to_vec()));
            state.gates.get(library.as_str()).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state
            .lock()
            .responses
            .get(library.as_str())
            .cloned()
            .unwrap_or_else(|| Err(not_found()))
    }
}

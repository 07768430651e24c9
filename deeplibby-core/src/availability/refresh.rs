use std::collections::HashMap;
use std::slice;
use std::sync::Arc;
use std::time::Duration;

use deeplibby_config::RefreshSettings;
use deeplibby_model::{
    AvailabilityRow, LibraryId, MediaId, UpstreamAvailabilityItem,
    UpstreamAvailabilityResponse,
};
use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::SharedSnapshot;
use super::reconcile::reconcile_row;
use crate::api::UpstreamAvailabilityService;
use crate::error::RefreshError;
use crate::time::{Sleep, TimeProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshWave {
    Favorites,
    NonFavorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
    Queued,
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRefresh {
    pub library: LibraryId,
    /// Offset from the moment the wave was triggered.
    pub delay: Duration,
}

/// What one trigger of a wave did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavePlan {
    pub wave: RefreshWave,
    pub scheduled: Vec<ScheduledRefresh>,
    /// Libraries already queued or in flight.
    pub skipped: Vec<LibraryId>,
}

#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Scheduled {
        library: LibraryId,
        delay: Duration,
    },
    Reconciled {
        library: LibraryId,
        row: AvailabilityRow,
    },
    Failed {
        library: LibraryId,
        error: RefreshError,
    },
}

type WorkSet = Arc<Mutex<HashMap<LibraryId, WorkState>>>;

/// Staggered live refresh of the rows of one snapshot.
///
/// Each wave queues the libraries that are not already queued or in
/// flight; the `k`-th newly queued library fires `k * base_delay` after the
/// trigger (non-favorites also get `inter_wave_delay` on top). A semaphore
/// caps the number of concurrent upstream calls. Every refresh is
/// independent: a failure leaves its row stale and is never retried.
///
/// One scheduler belongs to one snapshot. Dropping it cancels outstanding
/// work unless `cancel_on_teardown` is off.
#[derive(Debug)]
pub struct LiveRefreshScheduler {
    upstream: Arc<dyn UpstreamAvailabilityService>,
    time: Arc<dyn TimeProvider>,
    settings: RefreshSettings,
    snapshot: SharedSnapshot,
    media_id: MediaId,
    work: WorkSet,
    permits: Arc<Semaphore>,
    token: CancellationToken,
    tracker: TaskTracker,
    events: Option<mpsc::UnboundedSender<RefreshEvent>>,
}

impl LiveRefreshScheduler {
    pub fn new(
        upstream: Arc<dyn UpstreamAvailabilityService>,
        time: Arc<dyn TimeProvider>,
        settings: RefreshSettings,
        snapshot: SharedSnapshot,
    ) -> Self {
        let media_id = snapshot.read().media.id.clone();
        let permits = Arc::new(Semaphore::new(settings.max_in_flight.max(1)));

        Self {
            upstream,
            time,
            settings,
            snapshot,
            media_id,
            work: Arc::new(Mutex::new(HashMap::new())),
            permits,
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            events: None,
        }
    }

    pub fn with_event_sink(
        mut self,
        sender: mpsc::UnboundedSender<RefreshEvent>,
    ) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn snapshot(&self) -> &SharedSnapshot {
        &self.snapshot
    }

    pub fn refresh_favorites(&self) -> WavePlan {
        let targets = self.snapshot.read().library_ids(true);
        self.schedule_wave(
            RefreshWave::Favorites,
            targets,
            self.settings.favorites_base_delay,
            Duration::ZERO,
        )
    }

    pub fn refresh_non_favorites(&self) -> WavePlan {
        let targets = self.snapshot.read().library_ids(false);
        self.schedule_wave(
            RefreshWave::NonFavorites,
            targets,
            self.settings.non_favorites_base_delay,
            self.settings.inter_wave_delay,
        )
    }

    pub fn refresh_all(&self) -> [WavePlan; 2] {
        [self.refresh_favorites(), self.refresh_non_favorites()]
    }

    /// Current work set, sorted by library id.
    pub fn outstanding(&self) -> Vec<(LibraryId, WorkState)> {
        let mut entries: Vec<_> = self
            .work
            .lock()
            .iter()
            .map(|(library, state)| (library.clone(), *state))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Wait until every refresh scheduled so far has settled.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel everything queued or in flight. Further triggers are no-ops.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            info!(
                media = %self.media_id,
                outstanding = self.work.lock().len(),
                "cancelling live refresh"
            );
            self.token.cancel();
        }
    }

    fn schedule_wave(
        &self,
        wave: RefreshWave,
        targets: Vec<LibraryId>,
        base_delay: Duration,
        offset: Duration,
    ) -> WavePlan {
        let mut plan = WavePlan {
            wave,
            scheduled: Vec::new(),
            skipped: Vec::new(),
        };
        if self.token.is_cancelled() {
            plan.skipped = targets;
            return plan;
        }

        {
            let mut work = self.work.lock();
            let mut position: u32 = 0;
            for library in targets {
                if work.contains_key(&library) {
                    plan.skipped.push(library);
                    continue;
                }
                position += 1;
                let delay = offset + base_delay.saturating_mul(position);
                work.insert(library.clone(), WorkState::Queued);
                plan.scheduled.push(ScheduledRefresh { library, delay });
            }
        }

        for scheduled in &plan.scheduled {
            debug!(
                library = %scheduled.library,
                delay = ?scheduled.delay,
                ?wave,
                "refresh queued"
            );
            emit(
                &self.events,
                RefreshEvent::Scheduled {
                    library: scheduled.library.clone(),
                    delay: scheduled.delay,
                },
            );
            let job = RefreshJob {
                upstream: Arc::clone(&self.upstream),
                snapshot: Arc::clone(&self.snapshot),
                work: Arc::clone(&self.work),
                permits: Arc::clone(&self.permits),
                token: self.token.clone(),
                events: self.events.clone(),
                media_id: self.media_id.clone(),
                library: scheduled.library.clone(),
            };
            let stagger = self.time.sleep(scheduled.delay);
            self.tracker.spawn(job.run(stagger));
        }

        if !plan.skipped.is_empty() {
            debug!(?wave, skipped = plan.skipped.len(), "libraries already pending");
        }
        plan
    }
}

impl Drop for LiveRefreshScheduler {
    fn drop(&mut self) {
        if self.settings.cancel_on_teardown {
            self.token.cancel();
        }
    }
}

fn emit(
    events: &Option<mpsc::UnboundedSender<RefreshEvent>>,
    event: RefreshEvent,
) {
    if let Some(sender) = events {
        let _ = sender.send(event);
    }
}

struct RefreshJob {
    upstream: Arc<dyn UpstreamAvailabilityService>,
    snapshot: SharedSnapshot,
    work: WorkSet,
    permits: Arc<Semaphore>,
    token: CancellationToken,
    events: Option<mpsc::UnboundedSender<RefreshEvent>>,
    media_id: MediaId,
    library: LibraryId,
}

impl RefreshJob {
    async fn run(self, stagger: Sleep) {
        let outcome = self.execute(stagger).await;
        self.work.lock().remove(&self.library);

        match outcome {
            Some(Ok(row)) => {
                debug!(
                    library = %self.library,
                    available = row.available_count,
                    wait = row.estimated_wait_days,
                    "row reconciled"
                );
                emit(
                    &self.events,
                    RefreshEvent::Reconciled {
                        library: self.library,
                        row,
                    },
                );
            }
            Some(Err(error)) => {
                warn!(library = %self.library, error = %error, "refresh failed");
                emit(
                    &self.events,
                    RefreshEvent::Failed {
                        library: self.library,
                        error,
                    },
                );
            }
            None => debug!(library = %self.library, "refresh cancelled"),
        }
    }

    /// `None` when cancelled before completion.
    async fn execute(
        &self,
        stagger: Sleep,
    ) -> Option<Result<AvailabilityRow, RefreshError>> {
        tokio::select! {
            _ = self.token.cancelled() => return None,
            _ = stagger => {}
        }

        let _permit = tokio::select! {
            _ = self.token.cancelled() => return None,
            permit = Arc::clone(&self.permits).acquire_owned() => permit.ok()?,
        };
        if let Some(state) = self.work.lock().get_mut(&self.library) {
            *state = WorkState::InFlight;
        }

        let response = tokio::select! {
            _ = self.token.cancelled() => return None,
            response = self.upstream.fetch_availability(
                &self.library,
                slice::from_ref(&self.media_id),
            ) => response,
        };

        Some(match response {
            Ok(response) => self.apply(&response),
            Err(source) => Err(RefreshError::Upstream {
                library: self.library.clone(),
                source,
            }),
        })
    }

    fn apply(
        &self,
        response: &UpstreamAvailabilityResponse,
    ) -> Result<AvailabilityRow, RefreshError> {
        let item = item_for_media(response, &self.media_id).ok_or_else(|| {
            RefreshError::MissingItem {
                library: self.library.clone(),
            }
        })?;

        let mut snapshot = self.snapshot.write();
        let row = snapshot.row(&self.library).ok_or_else(|| {
            RefreshError::UnknownLibrary {
                library: self.library.clone(),
            }
        })?;
        let updated = reconcile_row(row, item);
        snapshot.replace_row(updated.clone());
        Ok(updated)
    }
}

/// The item for `media_id`, or the lone id-less item of a single-id reply.
fn item_for_media<'a>(
    response: &'a UpstreamAvailabilityResponse,
    media_id: &MediaId,
) -> Option<&'a UpstreamAvailabilityItem> {
    response.item_for(media_id).or_else(|| {
        let mut items = response.items.iter().flatten();
        match (items.next(), items.next()) {
            (Some(only), None) if only.id.is_none() => Some(only),
            _ => None,
        }
    })
}

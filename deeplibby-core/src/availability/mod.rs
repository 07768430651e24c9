//! Availability snapshots and their live refresh.

mod loader;
mod reconcile;
mod refresh;

use std::sync::Arc;

use deeplibby_model::AvailabilitySnapshot;
use parking_lot::RwLock;

pub use loader::{AvailabilitySnapshotLoader, annotate};
pub use reconcile::reconcile_row;
pub use refresh::{
    LiveRefreshScheduler, RefreshEvent, RefreshWave, ScheduledRefresh,
    WavePlan, WorkState,
};

/// The active view's snapshot, shared with in-flight refreshes. The lock
/// is only taken for short synchronous reads and row swaps.
pub type SharedSnapshot = Arc<RwLock<AvailabilitySnapshot>>;

pub fn shared(snapshot: AvailabilitySnapshot) -> SharedSnapshot {
    Arc::new(RwLock::new(snapshot))
}

//! Collection comparison between two libraries, or of one library against
//! everything else.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use deeplibby_model::{DiffEntry, IntersectEntry, LibraryId, UniqueResponse};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::api::ApiService;
use crate::error::CompareError;

/// The two sides of a comparison. Either side may be unset while the user
/// is still choosing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryPair {
    pub left: Option<LibraryId>,
    pub right: Option<LibraryId>,
}

/// Runs one comparison at a time. A request made while another is running
/// is refused with [`CompareError::Busy`] instead of being queued.
#[derive(Debug)]
pub struct ComparisonLoader {
    api: Arc<dyn ApiService>,
    pair: Mutex<LibraryPair>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ComparisonLoader {
    pub fn new(api: Arc<dyn ApiService>) -> Self {
        Self {
            api,
            pair: Mutex::new(LibraryPair::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn pair(&self) -> LibraryPair {
        self.pair.lock().clone()
    }

    pub fn set_left(&self, library: Option<LibraryId>) {
        self.pair.lock().left = library;
    }

    pub fn set_right(&self, library: Option<LibraryId>) {
        self.pair.lock().right = library;
    }

    /// Swap the two sides.
    pub fn flip(&self) -> LibraryPair {
        let mut pair = self.pair.lock();
        let LibraryPair { left, right } = &mut *pair;
        std::mem::swap(left, right);
        pair.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Titles the left library owns that the right one does not.
    pub async fn diff(&self) -> Result<Vec<DiffEntry>, CompareError> {
        let (left, right) = self.complete_pair()?;
        let _guard = self.begin()?;
        let entries = self.api.diff(&left, &right).await?;
        info!(left = %left, right = %right, titles = entries.len(), "diff loaded");
        Ok(entries)
    }

    /// Titles both libraries own.
    pub async fn intersect(&self) -> Result<Vec<IntersectEntry>, CompareError> {
        let (left, right) = self.complete_pair()?;
        let _guard = self.begin()?;
        let entries = self.api.intersect(&left, &right).await?;
        info!(left = %left, right = %right, titles = entries.len(), "intersection loaded");
        Ok(entries)
    }

    /// Titles only `library` owns.
    pub async fn unique(
        &self,
        library: &LibraryId,
    ) -> Result<UniqueResponse, CompareError> {
        let _guard = self.begin()?;
        let response = self.api.unique(library).await?;
        info!(library = %library, titles = response.unique.len(), "unique titles loaded");
        Ok(response)
    }

    fn complete_pair(&self) -> Result<(LibraryId, LibraryId), CompareError> {
        match self.pair() {
            LibraryPair {
                left: Some(left),
                right: Some(right),
            } => Ok((left, right)),
            _ => Err(CompareError::Incomplete),
        }
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, CompareError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("comparison already running, ignoring request");
            return Err(CompareError::Busy);
        }
        Ok(InFlightGuard(&self.in_flight))
    }
}

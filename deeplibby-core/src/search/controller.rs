use std::sync::Arc;

use deeplibby_config::SearchSettings;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ranker::RelevanceRanker;
use super::types::{
    PresentationContext, SearchEvent, SearchOutcome, SearchPhase, SearchView,
};
use crate::api::ApiService;
use crate::time::{Sleep, TimeProvider};

/// Turns keystrokes into debounced, cancellable searches.
///
/// Every input bumps a generation counter and replaces the cancellation
/// token, so at most one request is live. A response is applied only when
/// its generation is still the latest, so the visible results always come
/// from the most recent completed request no matter the order in which
/// responses arrive.
#[derive(Debug)]
pub struct SearchQueryController {
    api: Arc<dyn ApiService>,
    ranker: RelevanceRanker,
    time: Arc<dyn TimeProvider>,
    settings: SearchSettings,
    shared: Arc<Mutex<ControllerState>>,
    events: Option<mpsc::UnboundedSender<SearchEvent>>,
}

#[derive(Debug)]
struct ControllerState {
    generation: u64,
    token: CancellationToken,
    context: PresentationContext,
    view: SearchView,
}

impl SearchQueryController {
    pub fn new(
        api: Arc<dyn ApiService>,
        time: Arc<dyn TimeProvider>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            api,
            ranker: RelevanceRanker::new(),
            time,
            settings,
            shared: Arc::new(Mutex::new(ControllerState {
                generation: 0,
                token: CancellationToken::new(),
                context: PresentationContext::Wide,
                view: SearchView::default(),
            })),
            events: None,
        }
    }

    pub fn with_event_sink(
        mut self,
        sender: mpsc::UnboundedSender<SearchEvent>,
    ) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn set_context(&self, context: PresentationContext) {
        self.shared.lock().context = context;
    }

    pub fn set_viewport_width(&self, width: u32) {
        self.set_context(PresentationContext::from_width(
            width,
            &self.settings,
        ));
    }

    pub fn view(&self) -> SearchView {
        self.shared.lock().view.clone()
    }

    /// Handle a change of the search input. Must be called inside a tokio
    /// runtime. Returns the generation assigned to this input.
    pub fn input(&self, query: impl Into<String>) -> u64 {
        let query = query.into();
        let mut state = self.shared.lock();

        state.generation += 1;
        state.token.cancel();
        state.token = CancellationToken::new();
        if state.view.phase != SearchPhase::Idle {
            state.view.last_outcome = Some(SearchOutcome::Cancelled);
        }
        state.view.query = query.clone();
        let generation = state.generation;

        if query.is_empty() {
            state.view.phase = SearchPhase::Idle;
            state.view.results.clear();
            state.view.results_generation = None;
            state.view.error = None;
            emit(&self.events, SearchEvent::Cleared);
            debug!(generation, "search cleared");
            return generation;
        }

        state.view.phase = SearchPhase::Debouncing;
        let debounce = state.context.debounce(&self.settings);
        let token = state.token.clone();
        drop(state);

        debug!(generation, query = %query, ?debounce, "search debouncing");
        let task = SearchTask {
            api: Arc::clone(&self.api),
            ranker: self.ranker,
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            generation,
            query,
            token,
        };
        let debounce = self.time.sleep(debounce);
        tokio::spawn(task.run(debounce));
        generation
    }

    /// Cancel any pending or in-flight request.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        state.token.cancel();
        if state.view.phase != SearchPhase::Idle {
            state.view.phase = SearchPhase::Idle;
            state.view.last_outcome = Some(SearchOutcome::Cancelled);
        }
    }
}

impl Drop for SearchQueryController {
    fn drop(&mut self) {
        self.shared.lock().token.cancel();
    }
}

fn emit(
    events: &Option<mpsc::UnboundedSender<SearchEvent>>,
    event: SearchEvent,
) {
    if let Some(sender) = events {
        // A dropped receiver just means nobody is listening any more.
        let _ = sender.send(event);
    }
}

struct SearchTask {
    api: Arc<dyn ApiService>,
    ranker: RelevanceRanker,
    shared: Arc<Mutex<ControllerState>>,
    events: Option<mpsc::UnboundedSender<SearchEvent>>,
    generation: u64,
    query: String,
    token: CancellationToken,
}

impl SearchTask {
    async fn run(self, debounce: Sleep) {
        tokio::select! {
            _ = self.token.cancelled() => {
                debug!(generation = self.generation, "search superseded while debouncing");
                return;
            }
            _ = debounce => {}
        }

        {
            let mut state = self.shared.lock();
            if state.generation != self.generation {
                return;
            }
            state.view.phase = SearchPhase::InFlight;
        }

        let outcome = tokio::select! {
            _ = self.token.cancelled() => {
                debug!(generation = self.generation, "search request cancelled");
                return;
            }
            outcome = self.api.search(&self.query) => outcome,
        };
        let outcome =
            outcome.map(|results| self.ranker.rank(results, &self.query));

        let mut state = self.shared.lock();
        if state.generation != self.generation {
            debug!(
                generation = self.generation,
                current = state.generation,
                "dropping stale search response"
            );
            return;
        }

        state.view.phase = SearchPhase::Idle;
        match outcome {
            Ok(results) => {
                debug!(
                    generation = self.generation,
                    results = results.len(),
                    "search completed"
                );
                state.view.last_outcome = Some(SearchOutcome::Completed);
                state.view.results = results.clone();
                state.view.results_generation = Some(self.generation);
                state.view.error = None;
                emit(
                    &self.events,
                    SearchEvent::Results {
                        generation: self.generation,
                        query: self.query,
                        results,
                    },
                );
            }
            Err(error) => {
                warn!(generation = self.generation, error = %error, "search failed");
                state.view.last_outcome = Some(SearchOutcome::Failed);
                state.view.error = Some(error.clone());
                emit(
                    &self.events,
                    SearchEvent::Failed {
                        generation: self.generation,
                        query: self.query,
                        error,
                    },
                );
            }
        }
    }
}

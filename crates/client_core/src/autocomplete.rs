//! Text input with a debounced, remotely populated suggestion dropdown.

use std::{
    sync::{Arc, Mutex, Weak},
    time::Duration,
};

use shared::domain::Suggestion;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    api::SuggestionSource,
    debounce::{lock, Debouncer},
};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropdownState {
    #[default]
    Idle,
    Loading,
    Open,
    Closed,
}

/// Everything a front end needs to redraw the field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSnapshot {
    pub value: String,
    pub suggestions: Vec<Suggestion>,
    pub state: DropdownState,
}

impl FieldSnapshot {
    pub fn is_loading(&self) -> bool {
        self.state == DropdownState::Loading
    }

    /// Suggestions to render as a dropdown; empty unless the dropdown is open.
    pub fn visible_suggestions(&self) -> &[Suggestion] {
        match self.state {
            DropdownState::Open => &self.suggestions,
            _ => &[],
        }
    }
}

struct FieldState {
    snapshot: FieldSnapshot,
    // Bumped on every value change and every issued fetch; responses carrying an older
    // generation are stale.
    generation: u64,
    alive: bool,
}

struct FieldShared {
    state: Mutex<FieldState>,
    source: Arc<dyn SuggestionSource>,
    updates: watch::Sender<FieldSnapshot>,
}

impl FieldShared {
    fn publish(&self, state: &FieldState) {
        self.updates.send_replace(state.snapshot.clone());
    }

    async fn run_query(&self, query: String) {
        let generation = {
            let mut state = lock(&self.state);
            if !state.alive {
                return;
            }
            state.generation += 1;
            if query.trim().is_empty() {
                state.snapshot.suggestions.clear();
                state.snapshot.state = DropdownState::Closed;
                self.publish(&state);
                return;
            }
            state.snapshot.state = DropdownState::Loading;
            self.publish(&state);
            state.generation
        };

        let outcome = self.source.suggestions(&query).await;

        let mut state = lock(&self.state);
        if !state.alive || state.generation != generation {
            debug!(%query, "discarding stale suggestions");
            return;
        }
        match outcome {
            Ok(results) => {
                let exact_match = results.iter().any(|item| item.name == query);
                state.snapshot.state = if !results.is_empty() && !exact_match {
                    DropdownState::Open
                } else {
                    DropdownState::Closed
                };
                state.snapshot.suggestions = results;
            }
            Err(error) => {
                // Suggestions are advisory; the user only sees an empty dropdown.
                warn!(%query, %error, "failed to fetch suggestions");
                state.snapshot.suggestions.clear();
                state.snapshot.state = DropdownState::Closed;
            }
        }
        self.publish(&state);
    }
}

pub struct AutocompleteField {
    shared: Arc<FieldShared>,
    debouncer: Debouncer<String>,
}

impl AutocompleteField {
    pub fn new(source: Arc<dyn SuggestionSource>) -> Self {
        Self::with_delay(source, SEARCH_DEBOUNCE)
    }

    pub fn with_delay(source: Arc<dyn SuggestionSource>, delay: Duration) -> Self {
        let (updates, _) = watch::channel(FieldSnapshot::default());
        let shared = Arc::new(FieldShared {
            state: Mutex::new(FieldState {
                snapshot: FieldSnapshot::default(),
                generation: 0,
                alive: true,
            }),
            source,
            updates,
        });
        let weak: Weak<FieldShared> = Arc::downgrade(&shared);
        let debouncer = Debouncer::new(delay, move |query: String| {
            let weak = weak.clone();
            async move {
                if let Some(shared) = weak.upgrade() {
                    shared.run_query(query).await;
                }
            }
        });
        Self { shared, debouncer }
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        lock(&self.shared.state).snapshot.clone()
    }

    pub fn value(&self) -> String {
        lock(&self.shared.state).snapshot.value.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FieldSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Keystroke or programmatic change. Re-arms the debounced search with `value`.
    pub fn set_value(&self, value: impl Into<String>) {
        let value = value.into();
        {
            let mut state = lock(&self.shared.state);
            if !state.alive {
                return;
            }
            state.snapshot.value = value.clone();
            state.generation += 1;
            self.shared.publish(&state);
        }
        self.debouncer.call(value);
    }

    /// Takes the suggestion's name as the new value and closes the dropdown.
    pub fn select(&self, suggestion: &Suggestion) {
        self.set_value(suggestion.name.clone());
        let mut state = lock(&self.shared.state);
        if state.alive {
            state.snapshot.state = DropdownState::Closed;
            self.shared.publish(&state);
        }
    }

    /// A pointer press landed outside the field. The value is left untouched.
    pub fn click_outside(&self) {
        let mut state = lock(&self.shared.state);
        if state.alive && state.snapshot.state == DropdownState::Open {
            state.snapshot.state = DropdownState::Closed;
            self.shared.publish(&state);
        }
    }

    /// Skips the quiet period and searches for the current value right away.
    pub async fn search_now(&self) -> FieldSnapshot {
        self.debouncer.cancel();
        let query = self.value();
        self.shared.run_query(query).await;
        self.snapshot()
    }

    pub fn is_search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Stops pending searches and ignores any response still in flight.
    pub fn teardown(&self) {
        self.debouncer.cancel();
        lock(&self.shared.state).alive = false;
    }
}

impl Drop for AutocompleteField {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "tests/autocomplete_tests.rs"]
mod tests;

//! # Store
//!
//! The single holder of [`AppState`]. The tree is replaced, never mutated:
//! each dispatch runs the root reducer and publishes the result as a fresh
//! `Arc<AppState>`, so snapshots handed out earlier stay valid and unchanged.
//!
//! Subscribers receive a [`tokio::sync::watch::Receiver`] and observe the
//! latest tree after every dispatch.

use huddle_core::{Action, AppState, reduce};
use std::sync::Arc;
use tokio::sync::watch;

/// Log context of store events.
pub const LOG_CONTEXT: &str = "store";

#[derive(Debug)]
pub struct Store {
    state: watch::Sender<Arc<AppState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// A store holding the initial state.
    pub fn new() -> Self {
        Self::with_state(AppState::initial())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self { state: tx }
    }

    /// The current tree.
    pub fn get_state(&self) -> Arc<AppState> {
        self.state.borrow().clone()
    }

    /// Reduce `action` into the tree and notify subscribers.
    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        self.state
            .send_modify(|state| *state = Arc::new(reduce(state, &action)));
        tracing::trace!(context = LOG_CONTEXT, action = action.label(), "dispatched");
    }

    /// Receive every published tree from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.state.subscribe()
    }

    /// Project the current tree through a selector.
    pub fn select<R>(&self, selector: impl FnOnce(&AppState) -> R) -> R {
        selector(&self.get_state())
    }
}

// =============================================================================
// TESTS
// =============================================================================

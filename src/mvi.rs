//! Unidirectional state flow for widget controllers.
//!
//! ```text
//! Intent ──→ Reducer ──→ State ──→ subscribers
//!    ↑                                │
//!    └──── controller / responses ────┘
//! ```
//!
//! Controllers never mutate state directly; they dispatch intents into a
//! [`Store`], which runs the pure reducer and publishes the result. Once a
//! store is detached (widget torn down) every further dispatch is refused.

use parking_lot::Mutex;
use tokio::sync::watch;

/// Snapshot of a widget's observable state.
pub trait WidgetState: Clone + PartialEq + Default + Send + Sync + 'static {}

/// A user action or a server outcome fed to a reducer.
pub trait Intent: Send + 'static {}

/// Pure state transition: `(State, Intent) -> State`.
pub trait Reducer {
    type State: WidgetState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}

/// Holds one widget's state and applies intents through reducer `R`.
pub struct Store<R: Reducer> {
    state: watch::Sender<R::State>,
    detached: Mutex<bool>,
}

impl<R: Reducer> Store<R> {
    pub fn new() -> Self {
        Self::with_state(R::State::default())
    }

    pub fn with_state(initial: R::State) -> Self {
        let (state, _rx) = watch::channel(initial);
        Self {
            state,
            detached: Mutex::new(false),
        }
    }

    pub fn snapshot(&self) -> R::State {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.state.subscribe()
    }

    /// Apply `intent`. Returns `false` if the store is detached.
    pub fn dispatch(&self, intent: R::Intent) -> bool {
        self.dispatch_with(|_| (intent, ())).is_some()
    }

    /// Build the intent from the current state and apply it atomically.
    ///
    /// `build` may also return a value derived from the state it saw, which
    /// is handed back to the caller. Returns `None` if the store is detached.
    pub fn dispatch_with<T>(
        &self,
        build: impl FnOnce(&R::State) -> (R::Intent, T),
    ) -> Option<T> {
        let detached = self.detached.lock();
        if *detached {
            return None;
        }

        let mut out = None;
        self.state.send_modify(|state| {
            let (intent, value) = build(state);
            *state = R::reduce(std::mem::take(state), intent);
            out = Some(value);
        });
        drop(detached);
        out
    }

    /// Refuse all future dispatches. Returns `true` on the first call only.
    pub fn detach(&self) -> bool {
        !std::mem::replace(&mut *self.detached.lock(), true)
    }

    pub fn is_detached(&self) -> bool {
        *self.detached.lock()
    }
}

impl<R: Reducer> Default for Store<R> {
    fn default() -> Self {
        Self::new()
    }
}

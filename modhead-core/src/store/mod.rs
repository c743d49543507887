//! Reactive application store
//!
//! A single [`Store`] owns the [`AppState`]. Events go in through
//! [`Store::dispatch`], which runs the reducer, notifies subscribers and hands
//! back the side effects the caller must execute. Derived values are plain
//! functions of the state, so they are recomputed on every change and never
//! go stale; [`Store::watch`] delivers a derived value only when it changes.

mod events;
mod state;

pub use events::{Effect, Event};
pub use state::AppState;

use crate::error::StoreError;

/// Handle returned by [`Store::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&AppState)>;

pub struct Store {
    state: AppState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies an event and notifies subscribers
    ///
    /// Subscribers are only notified when the event was applied; a rejected
    /// event leaves the state untouched.
    pub fn dispatch(&mut self, event: Event) -> Result<Vec<Effect>, StoreError> {
        log::debug!("dispatch {:?}", event);
        let effects = self.state.reduce(event)?;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
        Ok(effects)
    }

    /// Registers a listener called with the new state after every applied event
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Registers a listener for a derived value
    ///
    /// `on_change` is called immediately with the current value and afterwards
    /// only when the value returned by `select` differs from the last one.
    pub fn watch<T, S, F>(&mut self, select: S, mut on_change: F) -> SubscriptionId
    where
        T: PartialEq + 'static,
        S: Fn(&AppState) -> T + 'static,
        F: FnMut(&T) + 'static,
    {
        let mut last = select(&self.state);
        on_change(&last);
        self.subscribe(move |state| {
            let next = select(state);
            if next != last {
                on_change(&next);
                last = next;
            }
        })
    }

    /// Removes a listener; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}

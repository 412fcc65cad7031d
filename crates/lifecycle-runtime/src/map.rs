//! # Observer Map
//!
//! Ordered arena of `(observer, last delivered state)` entries, keyed by
//! [`ObserverId`]. Ids are allocated from a monotonic counter, so keeping
//! the entries sorted by id keeps them in insertion order and lookups are a
//! binary search.
//!
//! The dispatch engine never holds an iterator across a callback. It asks
//! [`ObserverMap::next_step`] for one `(observer, event)` pair, releases the
//! map, invokes the callback, and then writes the new state back by id.
//! Entries added or removed by the callback are simply seen (or not) on the
//! next call.
//!
//! ## Step Selection
//!
//! - Backward work first: among entries above the target, the one with the
//!   highest state, ties going to the most recently added.
//! - Otherwise forward work: among entries below the target, the one with
//!   the lowest state, ties going to the earliest added.
//!
//! Every observer therefore crosses an edge before any observer crosses the
//! next one, forward passes run in insertion order and backward passes run
//! in reverse insertion order.

use lifecycle_core::{Event, ObserverId, State};

use crate::observer::ObserverRef;

#[derive(Debug)]
struct Entry {
    id: ObserverId,
    observer: ObserverRef,
    state: State,
}

/// One unit of dispatch work.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub id: ObserverId,
    pub observer: ObserverRef,
    pub event: Event,
    pub from: State,
    pub to: State,
}

/// Insertion-ordered observer entries.
#[derive(Debug, Default)]
pub(crate) struct ObserverMap {
    entries: Vec<Entry>,
}

impl ObserverMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append an entry. `id` must be greater than every id already present.
    pub fn push(&mut self, id: ObserverId, observer: ObserverRef, state: State) {
        debug_assert!(self.entries.last().map_or(true, |last| last.id < id));
        self.entries.push(Entry {
            id,
            observer,
            state,
        });
    }

    /// Id of the entry holding this exact observer, if any.
    pub fn find(&self, observer: &ObserverRef) -> Option<ObserverId> {
        self.entries
            .iter()
            .find(|entry| entry.observer.same_observer(observer))
            .map(|entry| entry.id)
    }

    pub fn contains(&self, id: ObserverId) -> bool {
        self.position(id).is_some()
    }

    pub fn remove(&mut self, id: ObserverId) -> Option<ObserverRef> {
        let index = self.position(id)?;
        Some(self.entries.remove(index).observer)
    }

    pub fn state_of(&self, id: ObserverId) -> Option<State> {
        self.position(id).map(|index| self.entries[index].state)
    }

    /// Record a delivered state. Returns `false` if the entry is gone.
    pub fn set_state(&mut self, id: ObserverId, state: State) -> bool {
        match self.position(id) {
            Some(index) => {
                self.entries[index].state = state;
                true
            }
            None => false,
        }
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<ObserverId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Drop every entry, handing them back so the caller controls when the
    /// observers themselves are released.
    pub fn take(&mut self) -> Vec<ObserverRef> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|entry| entry.observer)
            .collect()
    }

    /// Whether every entry that can move has reached `target`.
    pub fn is_synced(&self, target: State) -> bool {
        self.next_step(target).is_none()
    }

    /// The next edge to deliver to bring the map toward `target`.
    ///
    /// Entries with no edge toward the target (an observer still at
    /// INITIALIZED when the target is DESTROYED) are skipped: they never
    /// saw ON_CREATE, so they are owed nothing.
    pub fn next_step(&self, target: State) -> Option<Step> {
        self.next_backward(target)
            .or_else(|| self.next_forward(target))
    }

    fn next_backward(&self, target: State) -> Option<Step> {
        let mut pick: Option<(&Entry, Event, State)> = None;
        for entry in self.entries.iter().rev() {
            if entry.state <= target {
                continue;
            }
            let Some((event, to)) = Event::down_from(entry.state)
                .and_then(|event| Some((event, event.target_state()?)))
            else {
                continue;
            };
            if pick.map_or(true, |(best, _, _)| entry.state > best.state) {
                pick = Some((entry, event, to));
            }
        }
        pick.map(|(entry, event, to)| Step::of(entry, event, to))
    }

    fn next_forward(&self, target: State) -> Option<Step> {
        let mut pick: Option<(&Entry, Event, State)> = None;
        for entry in &self.entries {
            if entry.state >= target {
                continue;
            }
            let Some((event, to)) = Event::up_from(entry.state)
                .and_then(|event| Some((event, event.target_state()?)))
            else {
                continue;
            };
            if pick.map_or(true, |(best, _, _)| entry.state < best.state) {
                pick = Some((entry, event, to));
            }
        }
        pick.map(|(entry, event, to)| Step::of(entry, event, to))
    }

    fn position(&self, id: ObserverId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |entry| entry.id).ok()
    }
}

impl Step {
    fn of(entry: &Entry, event: Event, to: State) -> Self {
        Self {
            id: entry.id,
            observer: entry.observer.clone(),
            event,
            from: entry.state,
            to,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

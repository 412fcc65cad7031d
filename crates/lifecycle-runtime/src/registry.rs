//! # Lifecycle Registry — Public Facade
//!
//! [`Lifecycle`] is the per-owner state machine. The owning component
//! reports platform callbacks through [`Lifecycle::handle_transition`];
//! library code registers observers with [`Lifecycle::add_observer`].
//!
//! ## Transition Rules
//!
//! | Event | Legal from |
//! |-------|-----------|
//! | `ON_CREATE` | INITIALIZED |
//! | `ON_START` | CREATED |
//! | `ON_RESUME` | STARTED |
//! | `ON_PAUSE` | RESUMED |
//! | `ON_STOP` | STARTED, RESUMED |
//! | `ON_DESTROY` | CREATED, STARTED, RESUMED |
//!
//! Forward events climb exactly one rung. Backward events may drop several
//! rungs at once (a component stopped while resumed); observers still walk
//! down one edge at a time. `ON_ANY` is never a legal transition.
//!
//! ## Threading
//!
//! A `Lifecycle` is `!Send`: it is built on `Rc`/`RefCell` and belongs to
//! the owner's thread. Cloning it clones a handle to the same registry.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use lifecycle_core::{Event, LifecycleError, ObserverId, State};

use crate::association::Associations;
use crate::config::LifecycleConfig;
use crate::history::{History, TransitionRecord};
use crate::map::ObserverMap;
use crate::observer::ObserverRef;

pub(crate) struct Registry {
    pub(crate) owner: String,
    pub(crate) state: State,
    pub(crate) observers: ObserverMap,
    last_id: ObserverId,
    /// Set while a sync loop is walking observers.
    pub(crate) dispatching: bool,
    /// Observer whose callback is running.
    pub(crate) current: Option<ObserverId>,
    history: History,
    associations: Associations,
}

impl Registry {
    fn allocate_id(&mut self) -> ObserverId {
        self.last_id = self.last_id.next();
        self.last_id
    }
}

/// Handle to one owner's lifecycle registry.
#[derive(Clone)]
pub struct Lifecycle {
    pub(crate) inner: Rc<RefCell<Registry>>,
}

impl Lifecycle {
    /// Create a registry from validated configuration.
    pub fn new(config: LifecycleConfig) -> Result<Self, LifecycleError> {
        config.validate()?;
        tracing::debug!(
            owner = %config.owner,
            state = %config.initial_state,
            "lifecycle registry created"
        );
        Ok(Self::build(config))
    }

    /// Create a registry in INITIALIZED with default settings.
    ///
    /// A blank name falls back to the default owner name.
    pub fn with_owner(owner: impl Into<String>) -> Self {
        let mut config = LifecycleConfig::new(owner);
        if config.owner.trim().is_empty() {
            config.owner = LifecycleConfig::default().owner;
        }
        Self::build(config)
    }

    fn build(config: LifecycleConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                owner: config.owner,
                state: config.initial_state,
                observers: ObserverMap::new(),
                last_id: ObserverId::from_raw(0),
                dispatching: false,
                current: None,
                history: History::new(config.history_limit),
                associations: Associations::default(),
            })),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The owner's current state.
    ///
    /// During dispatch this is already the state being moved to.
    pub fn current_state(&self) -> State {
        self.inner.borrow().state
    }

    /// Whether the current state is at least `state`.
    pub fn is_at_least(&self, state: State) -> bool {
        self.current_state().is_at_least(state)
    }

    /// Owner name from configuration.
    pub fn owner(&self) -> String {
        self.inner.borrow().owner.clone()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Registered observer ids in insertion order.
    pub fn observers(&self) -> Vec<ObserverId> {
        self.inner.borrow().observers.ids()
    }

    /// Whether `id` is still registered.
    pub fn contains_observer(&self, id: ObserverId) -> bool {
        self.inner.borrow().observers.contains(id)
    }

    /// Last state delivered to `id`, if registered.
    pub fn observer_state(&self, id: ObserverId) -> Option<State> {
        self.inner.borrow().observers.state_of(id)
    }

    /// The observer whose callback is currently running.
    ///
    /// Lets an observer remove itself from inside its callback.
    pub fn dispatching_observer(&self) -> Option<ObserverId> {
        self.inner.borrow().current
    }

    /// Whether every observer has caught up with the current state.
    pub fn is_synced(&self) -> bool {
        let registry = self.inner.borrow();
        registry.observers.is_synced(registry.state)
    }

    /// Recent owner-level state moves, oldest first.
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.inner.borrow().history.snapshot()
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Register an observer and walk it up to the current state.
    ///
    /// The observer receives every event from ON_CREATE up to the current
    /// state, one edge at a time, before this returns. Called from inside
    /// another observer's callback, the catch-up happens before the
    /// enclosing dispatch returns instead.
    ///
    /// Adding a handle that is already registered returns its existing id.
    /// After DESTROYED the observer is neither stored nor invoked and a
    /// detached id is returned.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Observer`] if any callback run by the catch-up
    /// fails. The new observer stays registered at whatever state it
    /// reached.
    pub fn add_observer(&self, observer: ObserverRef) -> Result<ObserverId, LifecycleError> {
        let id = {
            let mut registry = self.inner.borrow_mut();
            if let Some(existing) = registry.observers.find(&observer) {
                return Ok(existing);
            }
            let id = registry.allocate_id();
            if registry.state.is_terminal() {
                tracing::debug!(
                    owner = %registry.owner,
                    %id,
                    "ignoring observer added after destruction"
                );
                return Ok(id);
            }
            registry.observers.push(id, observer, State::Initialized);
            id
        };
        self.drive()?;
        Ok(id)
    }

    /// Unregister an observer. No events are delivered.
    ///
    /// Safe to call from any callback, including the removed observer's
    /// own. Returns `false` if `id` was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let removed = self.inner.borrow_mut().observers.remove(id);
        // Dropped after the borrow is released.
        removed.is_some()
    }

    /// [`remove_observer`](Self::remove_observer) by handle instead of id.
    pub fn remove_observer_ref(&self, observer: &ObserverRef) -> bool {
        let id = self.inner.borrow().observers.find(observer);
        id.map_or(false, |id| self.remove_observer(id))
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Apply a lifecycle event reported by the owner.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::IllegalTransition`] if the event is not legal
    ///   from the current state. The registry is left unchanged.
    /// - [`LifecycleError::Observer`] if a callback fails. The new state
    ///   stands and observers already notified keep their progress. On the
    ///   way to DESTROYED the failing observer is detached instead, the
    ///   remaining observers are still torn down, and the registry is
    ///   cleared before the first error is returned.
    pub fn handle_transition(&self, event: Event) -> Result<(), LifecycleError> {
        let (from, to) = {
            let registry = self.inner.borrow();
            let from = registry.state;
            let to = legal_target(from, event)
                .ok_or(LifecycleError::IllegalTransition { from, event })?;
            (from, to)
        };
        tracing::trace!(%event, %from, %to, "handling lifecycle event");
        self.move_to(to, Some(event))
    }

    /// Move directly to `state`, as when restoring a recreated owner.
    ///
    /// No event legality check is applied; observers are still walked one
    /// edge at a time.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Terminal`] once DESTROYED.
    /// - [`LifecycleError::NoEventDown`] for INITIALIZED → DESTROYED, and
    ///   for any move back down to INITIALIZED: no event lands there.
    /// - [`LifecycleError::Observer`] if a callback fails.
    pub fn set_current_state(&self, state: State) -> Result<(), LifecycleError> {
        {
            let registry = self.inner.borrow();
            if registry.state == state {
                return Ok(());
            }
            if registry.state.is_terminal() {
                return Err(LifecycleError::Terminal {
                    owner: registry.owner.clone(),
                });
            }
            let no_edge = state == State::Initialized
                || (registry.state == State::Initialized && state == State::Destroyed);
            if no_edge {
                return Err(LifecycleError::NoEventDown {
                    state: registry.state,
                    owner: registry.owner.clone(),
                });
            }
        }
        self.move_to(state, None)
    }

    fn move_to(&self, next: State, event: Option<Event>) -> Result<(), LifecycleError> {
        {
            let mut registry = self.inner.borrow_mut();
            let from = registry.state;
            if from == next {
                return Ok(());
            }
            registry.state = next;
            registry.history.record(from, next, event);
            tracing::debug!(
                owner = %registry.owner,
                %from,
                to = %next,
                nested = registry.dispatching,
                "lifecycle state moved"
            );
        }
        self.drive()
    }

    // ── Associations ─────────────────────────────────────────────────

    /// The value of type `T` attached to this registry, created with
    /// `init` on first access.
    ///
    /// After DESTROYED nothing is retained: `init` runs on every call and
    /// its value is returned without being stored.
    pub fn association<T, F>(&self, init: F) -> Rc<T>
    where
        T: Any,
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.inner.borrow().associations.get::<T>() {
            return existing;
        }
        let value = Rc::new(init());
        let mut registry = self.inner.borrow_mut();
        if registry.state.is_terminal() {
            return value;
        }
        if let Some(existing) = registry.associations.get::<T>() {
            return existing;
        }
        registry.associations.insert(Rc::clone(&value));
        value
    }

    /// Number of values in the association map.
    pub fn association_count(&self) -> usize {
        self.inner.borrow().associations.len()
    }

    /// Run the dispatch loop unless one is already running, then tear the
    /// registry down if it reached DESTROYED.
    ///
    /// A failure while moving to DESTROYED detaches the failing observer
    /// and the walk goes on, so every other observer still receives its
    /// teardown events and the registry is always cleared.
    fn drive(&self) -> Result<(), LifecycleError> {
        {
            let mut registry = self.inner.borrow_mut();
            if registry.dispatching {
                // The running loop re-reads the registry on every step.
                return Ok(());
            }
            registry.dispatching = true;
        }
        let guard = DispatchGuard { lifecycle: self };
        let mut failure = None;
        while let Err(err) = self.sync() {
            let terminal = self.current_state().is_terminal();
            let detach = match &err {
                LifecycleError::Observer { observer, .. } if terminal => Some(*observer),
                _ => None,
            };
            failure.get_or_insert(err);
            match detach {
                // Teardown continues past a failing observer; the first error is reported.
                Some(id) => {
                    self.remove_observer(id);
                }
                None => break,
            }
        }
        drop(guard);

        let cleared = {
            let mut registry = self.inner.borrow_mut();
            if registry.state.is_terminal() {
                tracing::debug!(
                    owner = %registry.owner,
                    observers = registry.observers.len(),
                    "lifecycle destroyed, clearing observers"
                );
                Some((registry.observers.take(), registry.associations.take()))
            } else {
                None
            }
        };
        drop(cleared);

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(registry) => f
                .debug_struct("Lifecycle")
                .field("owner", &registry.owner)
                .field("state", &registry.state)
                .field("observers", &registry.observers.len())
                .finish(),
            Err(_) => f.write_str("Lifecycle { <borrowed> }"),
        }
    }
}

/// Clears the dispatching flag when the sync loop ends, including by panic.
struct DispatchGuard<'a> {
    lifecycle: &'a Lifecycle,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.lifecycle.inner.try_borrow_mut() {
            registry.dispatching = false;
            registry.current = None;
        }
    }
}

/// Target state of `event` applied from `from`, if legal.
fn legal_target(from: State, event: Event) -> Option<State> {
    let target = event.target_state()?;
    if from.is_terminal() {
        return None;
    }
    if event.is_forward() {
        return (Event::up_from(from) == Some(event)).then_some(target);
    }
    // Nothing to tear down before ON_CREATE.
    if from == State::Initialized {
        return None;
    }
    (target < from).then_some(target)
}

// ─── Tests ───────────────────────────────────────────────────────────

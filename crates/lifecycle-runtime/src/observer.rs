//! # Observer Capability and Adapters
//!
//! The dispatch engine knows exactly one capability:
//! [`LifecycleObserver::on_state_changed`]. Everything else is an adapter
//! onto it.
//!
//! - [`ObserverRef::from_fn`] / [`ObserverRef::try_from_fn`] wrap closures.
//! - [`ObserverRef::from_default`] wraps a [`DefaultLifecycleObserver`],
//!   which has one method per event plus `on_any`, called for every event
//!   after the event-specific method.
//! - [`ObserverRef::new`] / [`ObserverRef::from_shared`] wrap a type that
//!   implements the capability directly.
//!
//! `ObserverRef` identity is pointer identity: registering a clone of a
//! handle that is already registered is a no-op.

use std::cell::RefCell;
use std::rc::Rc;

use lifecycle_core::{Event, ObserverError};

use crate::registry::Lifecycle;

/// Result type returned by observer callbacks.
pub type ObserverResult = Result<(), ObserverError>;

/// Receives lifecycle events for one owner.
pub trait LifecycleObserver {
    /// Called once per event, in dispatch order.
    ///
    /// `owner` is the lifecycle that produced the event. It may be used to
    /// query the state or to add and remove observers, including this one.
    fn on_state_changed(&mut self, owner: &Lifecycle, event: Event) -> ObserverResult;
}

/// Observer with one callback per lifecycle event.
///
/// All methods default to doing nothing.
pub trait DefaultLifecycleObserver {
    /// INITIALIZED → CREATED.
    fn on_create(&mut self, _owner: &Lifecycle) -> ObserverResult {
        Ok(())
    }

    /// CREATED → STARTED.
    fn on_start(&mut self, _owner: &Lifecycle) -> ObserverResult {
        Ok(())
    }

    /// STARTED → RESUMED.
    fn on_resume(&mut self, _owner: &Lifecycle) -> ObserverResult {
        Ok(())
    }

    /// RESUMED → STARTED.
    fn on_pause(&mut self, _owner: &Lifecycle) -> ObserverResult {
        Ok(())
    }

    /// STARTED → CREATED.
    fn on_stop(&mut self, _owner: &Lifecycle) -> ObserverResult {
        Ok(())
    }

    /// CREATED → DESTROYED.
    fn on_destroy(&mut self, _owner: &Lifecycle) -> ObserverResult {
        Ok(())
    }

    /// Every event, after the event-specific callback.
    fn on_any(&mut self, _owner: &Lifecycle, _event: Event) -> ObserverResult {
        Ok(())
    }
}

// ─── Adapters ────────────────────────────────────────────────────────

struct FnObserver<F>(F);

impl<F> LifecycleObserver for FnObserver<F>
where
    F: FnMut(&Lifecycle, Event),
{
    fn on_state_changed(&mut self, owner: &Lifecycle, event: Event) -> ObserverResult {
        (self.0)(owner, event);
        Ok(())
    }
}

struct TryFnObserver<F>(F);

impl<F> LifecycleObserver for TryFnObserver<F>
where
    F: FnMut(&Lifecycle, Event) -> ObserverResult,
{
    fn on_state_changed(&mut self, owner: &Lifecycle, event: Event) -> ObserverResult {
        (self.0)(owner, event)
    }
}

struct DefaultObserverAdapter<T>(T);

impl<T: DefaultLifecycleObserver> LifecycleObserver for DefaultObserverAdapter<T> {
    fn on_state_changed(&mut self, owner: &Lifecycle, event: Event) -> ObserverResult {
        let inner = &mut self.0;
        match event {
            Event::OnCreate => inner.on_create(owner)?,
            Event::OnStart => inner.on_start(owner)?,
            Event::OnResume => inner.on_resume(owner)?,
            Event::OnPause => inner.on_pause(owner)?,
            Event::OnStop => inner.on_stop(owner)?,
            Event::OnDestroy => inner.on_destroy(owner)?,
            Event::OnAny => {}
        }
        inner.on_any(owner, event)
    }
}

// ─── ObserverRef ─────────────────────────────────────────────────────

/// Shared handle to a registered (or registrable) observer.
#[derive(Clone)]
pub struct ObserverRef(Rc<RefCell<dyn LifecycleObserver>>);

impl ObserverRef {
    /// Wrap a value implementing [`LifecycleObserver`].
    pub fn new<O: LifecycleObserver + 'static>(observer: O) -> Self {
        Self(Rc::new(RefCell::new(observer)))
    }

    /// Wrap an observer the caller keeps a typed handle to.
    pub fn from_shared<O: LifecycleObserver + 'static>(observer: Rc<RefCell<O>>) -> Self {
        Self(observer)
    }

    /// Wrap an infallible closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(&Lifecycle, Event) + 'static,
    {
        Self::new(FnObserver(f))
    }

    /// Wrap a closure whose errors propagate to the transition caller.
    pub fn try_from_fn<F>(f: F) -> Self
    where
        F: FnMut(&Lifecycle, Event) -> ObserverResult + 'static,
    {
        Self::new(TryFnObserver(f))
    }

    /// Wrap a per-event [`DefaultLifecycleObserver`].
    pub fn from_default<T: DefaultLifecycleObserver + 'static>(observer: T) -> Self {
        Self::new(DefaultObserverAdapter(observer))
    }

    /// Whether both handles point at the same observer.
    pub fn same_observer(&self, other: &ObserverRef) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }

    /// Deliver one event.
    ///
    /// Fails instead of panicking if the caller is holding a borrow of the
    /// observer across the transition.
    pub(crate) fn notify(&self, owner: &Lifecycle, event: Event) -> ObserverResult {
        let mut observer = self
            .0
            .try_borrow_mut()
            .map_err(|_| ObserverError::new("observer is borrowed elsewhere during dispatch"))?;
        observer.on_state_changed(owner, event)
    }
}

impl std::fmt::Debug for ObserverRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObserverRef")
            .field(&(Rc::as_ptr(&self.0) as *const ()))
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

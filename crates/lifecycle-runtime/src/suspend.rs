//! # Suspend Until State
//!
//! Await a minimum lifecycle state, then run a block while the owner is
//! guaranteed to be in it.
//!
//! The block runs synchronously inside the observer callback that first
//! sees the owner at or above the requested state, so it observes exactly
//! the state it waited for. Its result is handed to the awaiting future over
//! a oneshot channel.

use tokio::sync::oneshot;

use lifecycle_core::{Event, LifecycleError, State};

use crate::observer::ObserverRef;
use crate::registry::Lifecycle;

/// Run `block` once `lifecycle` is at least `state`.
///
/// # Errors
///
/// - [`LifecycleError::InvalidTargetState`] for `state == DESTROYED`.
/// - [`LifecycleError::Destroyed`] if the owner is destroyed (or the
///   registry dropped) before reaching `state`.
pub async fn with_state_at_least<T, F>(
    lifecycle: &Lifecycle,
    state: State,
    block: F,
) -> Result<T, LifecycleError>
where
    T: 'static,
    F: FnOnce() -> T + 'static,
{
    if state.is_terminal() {
        return Err(LifecycleError::InvalidTargetState { state });
    }
    let current = lifecycle.current_state();
    if current >= state {
        return Ok(block());
    }
    if current.is_terminal() {
        return Err(LifecycleError::Destroyed);
    }

    let (tx, rx) = oneshot::channel();
    let mut pending = Some((block, tx));
    let observer = ObserverRef::from_fn(move |owner, event| {
        let reached = owner.current_state() >= state;
        if !reached && event != Event::OnDestroy {
            return;
        }
        if let Some(id) = owner.dispatching_observer() {
            owner.remove_observer(id);
        }
        if let Some((block, tx)) = pending.take() {
            let outcome = if reached {
                Ok(block())
            } else {
                Err(LifecycleError::Destroyed)
            };
            // The waiter may have been dropped; nothing to report to.
            let _ = tx.send(outcome);
        }
    });
    lifecycle.add_observer(observer)?;

    rx.await.unwrap_or(Err(LifecycleError::Destroyed))
}

/// [`with_state_at_least`] for CREATED.
pub async fn with_created<T, F>(lifecycle: &Lifecycle, block: F) -> Result<T, LifecycleError>
where
    T: 'static,
    F: FnOnce() -> T + 'static,
{
    with_state_at_least(lifecycle, State::Created, block).await
}

/// [`with_state_at_least`] for STARTED.
pub async fn with_started<T, F>(lifecycle: &Lifecycle, block: F) -> Result<T, LifecycleError>
where
    T: 'static,
    F: FnOnce() -> T + 'static,
{
    with_state_at_least(lifecycle, State::Started, block).await
}

/// [`with_state_at_least`] for RESUMED.
pub async fn with_resumed<T, F>(lifecycle: &Lifecycle, block: F) -> Result<T, LifecycleError>
where
    T: 'static,
    F: FnOnce() -> T + 'static,
{
    with_state_at_least(lifecycle, State::Resumed, block).await
}

// ─── Tests ───────────────────────────────────────────────────────────

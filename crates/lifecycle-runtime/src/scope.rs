//! # Lifecycle Scope
//!
//! Async work tied to an owner. Each registry has at most one
//! [`LifecycleScope`], kept in the registry's association map. The scope
//! carries a [`CancellationToken`] that is cancelled, exactly once, when the
//! registry delivers DESTROYED.
//!
//! ```text
//! LifecycleScope::of(&lifecycle) ──▶ association map ──▶ Rc<LifecycleScope>
//!                                        │
//!                          ON_DESTROY ───┴──▶ token.cancel(), observer removed
//! ```

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lifecycle_core::LifecycleError;

use crate::observer::ObserverRef;
use crate::registry::Lifecycle;

/// Cancellation scope bound to one registry.
#[derive(Debug)]
pub struct LifecycleScope {
    token: CancellationToken,
    registered: Cell<bool>,
}

impl LifecycleScope {
    /// The scope of `lifecycle`, created and registered on first access.
    ///
    /// A scope obtained after DESTROYED is already cancelled and is not
    /// retained.
    ///
    /// # Errors
    ///
    /// Registering the scope's observer runs a catch-up dispatch; a failing
    /// observer surfaces here.
    pub fn of(lifecycle: &Lifecycle) -> Result<Rc<Self>, LifecycleError> {
        let scope = lifecycle.association(|| LifecycleScope {
            token: CancellationToken::new(),
            registered: Cell::new(false),
        });
        if !scope.registered.replace(true) {
            scope.register(lifecycle)?;
        }
        Ok(scope)
    }

    fn register(&self, lifecycle: &Lifecycle) -> Result<(), LifecycleError> {
        if lifecycle.current_state().is_terminal() {
            self.token.cancel();
            return Ok(());
        }
        let token = self.token.clone();
        let observer = ObserverRef::from_fn(move |owner, _event| {
            if owner.current_state().is_terminal() {
                if let Some(id) = owner.dispatching_observer() {
                    owner.remove_observer(id);
                }
                token.cancel();
            }
        });
        lifecycle.add_observer(observer)?;
        Ok(())
    }

    /// Whether the owner has not been destroyed yet.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// A token cancelled when the owner is destroyed.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Run `future` until it completes or the owner is destroyed.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Destroyed`] if destruction wins.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, LifecycleError> {
        let token = self.token.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(LifecycleError::Destroyed),
            output = future => Ok(output),
        }
    }

    /// Spawn `future` on the current `LocalSet`, cancelled with the owner.
    ///
    /// Must be called from within a `tokio::task::LocalSet`.
    pub fn launch<F>(&self, future: F) -> JoinHandle<Result<F::Output, LifecycleError>>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let token = self.token.clone();
        tokio::task::spawn_local(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(LifecycleError::Destroyed),
                output = future => Ok(output),
            }
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

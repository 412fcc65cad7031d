//! # Dispatch Engine
//!
//! Brings every observer's last delivered state into agreement with the
//! registry's current state, one edge at a time.
//!
//! Each iteration re-reads the registry: it takes the next step from the
//! observer map, releases every borrow, runs the callback, then records the
//! new state by id. A callback is therefore free to add or remove
//! observers, or to move the registry again; the loop simply sees the
//! result on its next iteration. Only one loop walks a registry at a time:
//! nested moves update the target and return, leaving the work to the loop
//! already running.

use lifecycle_core::LifecycleError;

use crate::registry::Lifecycle;

impl Lifecycle {
    /// Walk observers until none has an edge left toward the current state.
    ///
    /// The caller must have set the registry's dispatching flag.
    ///
    /// # Errors
    ///
    /// Stops at the first failing callback. The failing observer keeps its
    /// previous state; observers updated before it keep their new ones.
    pub(crate) fn sync(&self) -> Result<(), LifecycleError> {
        loop {
            let step = {
                let mut registry = self.inner.borrow_mut();
                let target = registry.state;
                let step = registry.observers.next_step(target);
                registry.current = step.as_ref().map(|step| step.id);
                step
            };
            let Some(step) = step else {
                return Ok(());
            };

            tracing::trace!(
                observer = %step.id,
                event = %step.event,
                from = %step.from,
                to = %step.to,
                "dispatching lifecycle event"
            );
            let result = step.observer.notify(self, step.event);

            let mut registry = self.inner.borrow_mut();
            registry.current = None;
            if let Err(source) = result {
                tracing::warn!(
                    owner = %registry.owner,
                    observer = %step.id,
                    event = %step.event,
                    error = %source,
                    "lifecycle observer failed"
                );
                return Err(LifecycleError::Observer {
                    observer: step.id,
                    event: step.event,
                    source,
                });
            }
            // A callback that removed its own observer leaves nothing to update.
            registry.observers.set_state(step.id, step.to);
        }
    }
}

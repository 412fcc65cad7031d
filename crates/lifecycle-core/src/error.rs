//! # Error Types — Lifecycle Error Taxonomy
//!
//! All errors are synchronous: they are returned from the call that caused
//! them and nothing is retried or queued.
//!
//! - Transition errors carry the current state and the rejected event, and
//!   leave the registry untouched.
//! - Observer errors carry the failing observer and the event it was
//!   handling. Observers notified before the failure keep their new state.
//! - Adding an observer after destruction is *not* an error.

use thiserror::Error;

use crate::identity::ObserverId;
use crate::state::{Event, State};

/// Top-level error type for lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The event cannot be applied from the current state.
    #[error("illegal lifecycle transition: {event} from {from}")]
    IllegalTransition {
        /// State the registry was in.
        from: State,
        /// Rejected event.
        event: Event,
    },

    /// A restoration with no downward event to carry it: INITIALIZED to
    /// DESTROYED, or any state back to INITIALIZED.
    #[error("no event down from {state} in component {owner}")]
    NoEventDown {
        /// State the registry was in.
        state: State,
        /// Owner name.
        owner: String,
    },

    /// The registry has reached DESTROYED and accepts no further moves.
    #[error("lifecycle of {owner} is destroyed")]
    Terminal {
        /// Owner name.
        owner: String,
    },

    /// An observer callback failed while handling an event.
    #[error("observer {observer} failed handling {event}: {source}")]
    Observer {
        /// The failing observer.
        observer: ObserverId,
        /// The event being delivered.
        event: Event,
        /// The callback's error, unmodified.
        #[source]
        source: ObserverError,
    },

    /// A wait was requested for a state that can never be "at least" reached.
    #[error("target state must be at least INITIALIZED, got {state}")]
    InvalidTargetState {
        /// The rejected target.
        state: State,
    },

    /// The lifecycle was destroyed before the awaited work could run.
    #[error("attached lifecycle is destroyed")]
    Destroyed,

    /// Configuration rejected at registry construction.
    #[error("invalid lifecycle configuration: {0}")]
    Config(String),
}

impl LifecycleError {
    /// Whether this error was raised by an observer rather than the registry.
    pub fn is_observer_failure(&self) -> bool {
        matches!(self, Self::Observer { .. })
    }
}

/// Error returned by an observer callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ObserverError {
    message: String,
}

impl ObserverError {
    /// Create an observer error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ObserverError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ObserverError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

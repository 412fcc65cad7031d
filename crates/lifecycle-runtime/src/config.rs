//! # Registry Configuration
//!
//! Settings fixed at registry construction. Deserializable so that hosts
//! (and the replay CLI) can load them from YAML or JSON; missing fields
//! take their defaults.

use serde::{Deserialize, Serialize};

use lifecycle_core::{LifecycleError, State};

/// Default number of transition records kept per registry.
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

/// Construction-time settings for a [`Lifecycle`](crate::Lifecycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Owner name, used in logs and error messages.
    pub owner: String,
    /// Maximum retained transition records. Zero disables history.
    pub history_limit: usize,
    /// State the registry starts in. Must not be DESTROYED.
    pub initial_state: State,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            owner: "owner".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            initial_state: State::Initialized,
        }
    }
}

impl LifecycleConfig {
    /// Defaults with the given owner name.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Set the history limit.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the starting state.
    pub fn with_initial_state(mut self, state: State) -> Self {
        self.initial_state = state;
        self
    }

    /// Reject settings a registry cannot start from.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        if self.owner.trim().is_empty() {
            return Err(LifecycleError::Config("owner name must not be empty".into()));
        }
        if self.initial_state.is_terminal() {
            return Err(LifecycleError::Config(format!(
                "initial state must not be {}",
                self.initial_state
            )));
        }
        Ok(())
    }
}

//! # Transition History
//!
//! Bounded log of owner-level state moves. Each record is one call that
//! changed the registry's current state: an event (`handle_transition`) or
//! a restoration (`set_current_state`, recorded with no event). Observer
//! deliveries are not recorded here.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use lifecycle_core::{Event, State, Timestamp};

/// Record of a single owner-level state move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the move.
    pub from_state: State,
    /// State after the move.
    pub to_state: State,
    /// The event that caused the move, `None` for a restoration.
    pub event: Option<Event>,
    /// When the move happened (UTC).
    pub timestamp: Timestamp,
}

/// Ring buffer of the most recent records.
#[derive(Debug)]
pub(crate) struct History {
    limit: usize,
    records: VecDeque<TransitionRecord>,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            records: VecDeque::with_capacity(limit.min(64)),
        }
    }

    pub fn record(&mut self, from_state: State, to_state: State, event: Option<Event>) {
        if self.limit == 0 {
            return;
        }
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(TransitionRecord {
            from_state,
            to_state,
            event,
            timestamp: Timestamp::now(),
        });
    }

    pub fn snapshot(&self) -> Vec<TransitionRecord> {
        self.records.iter().cloned().collect()
    }
}

//! # lifecycle-core — Foundational Lifecycle Types
//!
//! The leaf crate of the workspace. It defines the vocabulary every other
//! crate speaks: the ordered lifecycle states, the events that move between
//! them, the error taxonomy, observer identifiers and timestamps.
//!
//! ## Key Design Principles
//!
//! 1. **Ordered states.** `State` derives `Ord` in ladder order, so
//!    `state >= State::Started` is the "at least started" check.
//!
//! 2. **One transition table.** `Event::target_state()` is the single place
//!    mapping events to states; the step helpers (`up_from`, `down_from`,
//!    `up_to`, `down_to`) are its inverses.
//!
//! 3. **Typed errors.** Every failure names the state and event involved.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lifecycle-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod state;
pub mod temporal;

pub use error::{LifecycleError, ObserverError};
pub use identity::ObserverId;
pub use state::{Event, State};
pub use temporal::Timestamp;

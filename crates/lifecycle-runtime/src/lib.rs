//! # lifecycle-runtime — Lifecycle Registry and Observer Dispatch
//!
//! Implements the per-owner lifecycle state machine. An owner (an activity,
//! a service, any component with a platform lifecycle) reports events to
//! its [`Lifecycle`]; the registry moves its current state and walks every
//! registered observer toward it.
//!
//! ## Modules
//!
//! - **Observer** (`observer.rs`): the single `on_state_changed` capability
//!   and its closure / per-event adapters.
//!
//! - **Map** (`map.rs`): insertion-ordered arena of
//!   `(observer, last delivered state)` entries and step selection.
//!
//! - **Dispatch** (`dispatch.rs`): the sync loop. One edge per step, fresh
//!   registry read per step, one loop per registry at a time.
//!
//! - **Registry** (`registry.rs`): the public facade. Transition legality,
//!   state restoration, history, teardown at DESTROYED.
//!
//! - **Scope** (`scope.rs`) and **Suspend** (`suspend.rs`): async helpers
//!   built on the association map and on self-removing observers.
//!
//! ## Ordering Guarantees
//!
//! Forward moves notify observers in insertion order, backward moves in
//! reverse insertion order, and no observer crosses a second edge before
//! every lagging observer has crossed the first. An observer added at any
//! point (including from another observer's callback) receives the full,
//! gap-free sequence from ON_CREATE up to the current state.
//!
//! ## Crate Policy
//!
//! - Single-threaded by construction: `Lifecycle` is `!Send`.
//! - No `unsafe` code.
//! - Observer failures propagate to the caller that triggered dispatch.

pub mod config;
pub mod history;
pub mod observer;
pub mod registry;
pub mod scope;
pub mod suspend;

mod association;
mod dispatch;
mod map;

// ─── Re-exports ─────────────────────────────────────────────────────

pub use config::{LifecycleConfig, DEFAULT_HISTORY_LIMIT};
pub use history::TransitionRecord;
pub use observer::{DefaultLifecycleObserver, LifecycleObserver, ObserverRef, ObserverResult};
pub use registry::Lifecycle;
pub use scope::LifecycleScope;
pub use suspend::{with_created, with_resumed, with_started, with_state_at_least};

pub use lifecycle_core::{Event, LifecycleError, ObserverError, ObserverId, State};

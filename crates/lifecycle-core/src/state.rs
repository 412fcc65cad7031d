//! # Lifecycle States and Events
//!
//! Defines the lifecycle ladder a component climbs and descends, and the
//! events that move it between rungs.
//!
//! ## States
//!
//! ```text
//! DESTROYED < INITIALIZED < CREATED < STARTED < RESUMED
//! ```
//!
//! The order is total and meaningful: "at least STARTED" means STARTED or
//! RESUMED.
//!
//! ## Events
//!
//! ```text
//!              ON_CREATE        ON_START        ON_RESUME
//! INITIALIZED ──────────▶ CREATED ──────▶ STARTED ───────▶ RESUMED
//!                          │  ▲             │  ▲              │
//!              ON_DESTROY  │  └── ON_STOP ──┘  └── ON_PAUSE ──┘
//!                          ▼
//!                      DESTROYED
//! ```
//!
//! `ON_ANY` is synthetic: observers listening for it are notified of every
//! event, but it never drives a transition by itself.

use serde::{Deserialize, Serialize};

// ─── State ───────────────────────────────────────────────────────────

/// A rung on the lifecycle ladder.
///
/// Variants are declared in ladder order so the derived `Ord` matches the
/// lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Terminal state. No further events are dispatched after this.
    Destroyed,
    /// Constructed but not yet created.
    Initialized,
    /// Created, or stopped after having been started.
    Created,
    /// Visible, or paused after having been resumed.
    Started,
    /// In the foreground and interactive.
    Resumed,
}

impl State {
    /// All states in ladder order, lowest first.
    pub const ALL: [State; 5] = [
        State::Destroyed,
        State::Initialized,
        State::Created,
        State::Started,
        State::Resumed,
    ];

    /// Whether this state is greater than or equal to `other`.
    pub fn is_at_least(self, other: State) -> bool {
        self >= other
    }

    /// Whether this state is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed)
    }

    /// The canonical upper-case name (e.g., "STARTED").
    pub fn name(self) -> &'static str {
        match self {
            Self::Destroyed => "DESTROYED",
            Self::Initialized => "INITIALIZED",
            Self::Created => "CREATED",
            Self::Started => "STARTED",
            Self::Resumed => "RESUMED",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Event ───────────────────────────────────────────────────────────

/// A lifecycle event delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// INITIALIZED → CREATED.
    OnCreate,
    /// CREATED → STARTED.
    OnStart,
    /// STARTED → RESUMED.
    OnResume,
    /// RESUMED → STARTED.
    OnPause,
    /// STARTED → CREATED.
    OnStop,
    /// CREATED → DESTROYED.
    OnDestroy,
    /// Matches every event. Never dispatched as a transition.
    OnAny,
}

impl Event {
    /// The six transition events, forward events first.
    pub const TRANSITIONS: [Event; 6] = [
        Event::OnCreate,
        Event::OnStart,
        Event::OnResume,
        Event::OnPause,
        Event::OnStop,
        Event::OnDestroy,
    ];

    /// The state a component is in right after this event.
    ///
    /// Returns `None` for [`Event::OnAny`], which has no target.
    pub fn target_state(self) -> Option<State> {
        match self {
            Self::OnCreate | Self::OnStop => Some(State::Created),
            Self::OnStart | Self::OnPause => Some(State::Started),
            Self::OnResume => Some(State::Resumed),
            Self::OnDestroy => Some(State::Destroyed),
            Self::OnAny => None,
        }
    }

    /// The event that moves a component one rung up, out of `state`.
    pub fn up_from(state: State) -> Option<Event> {
        match state {
            State::Initialized => Some(Self::OnCreate),
            State::Created => Some(Self::OnStart),
            State::Started => Some(Self::OnResume),
            State::Destroyed | State::Resumed => None,
        }
    }

    /// The event that moves a component one rung down, out of `state`.
    pub fn down_from(state: State) -> Option<Event> {
        match state {
            State::Created => Some(Self::OnDestroy),
            State::Started => Some(Self::OnStop),
            State::Resumed => Some(Self::OnPause),
            State::Destroyed | State::Initialized => None,
        }
    }

    /// The event that lands a component in `state` from the rung below.
    pub fn up_to(state: State) -> Option<Event> {
        match state {
            State::Created => Some(Self::OnCreate),
            State::Started => Some(Self::OnStart),
            State::Resumed => Some(Self::OnResume),
            State::Destroyed | State::Initialized => None,
        }
    }

    /// The event that lands a component in `state` from the rung above.
    pub fn down_to(state: State) -> Option<Event> {
        match state {
            State::Destroyed => Some(Self::OnDestroy),
            State::Created => Some(Self::OnStop),
            State::Started => Some(Self::OnPause),
            State::Initialized | State::Resumed => None,
        }
    }

    /// Whether this event raises the state.
    pub fn is_forward(self) -> bool {
        matches!(self, Self::OnCreate | Self::OnStart | Self::OnResume)
    }

    /// Whether this event lowers the state.
    pub fn is_backward(self) -> bool {
        matches!(self, Self::OnPause | Self::OnStop | Self::OnDestroy)
    }

    /// The canonical upper-case name (e.g., "ON_START").
    pub fn name(self) -> &'static str {
        match self {
            Self::OnCreate => "ON_CREATE",
            Self::OnStart => "ON_START",
            Self::OnResume => "ON_RESUME",
            Self::OnPause => "ON_PAUSE",
            Self::OnStop => "ON_STOP",
            Self::OnDestroy => "ON_DESTROY",
            Self::OnAny => "ON_ANY",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

//! # Replay Subcommand
//!
//! Drives a fresh [`Lifecycle`] through a scripted scenario and reports
//! every event delivered to every observer, the final state, and the
//! owner-level transition history.
//!
//! ## Scenario Format
//!
//! ```yaml
//! config: { owner: main-activity, history_limit: 64 }
//! observers: [logger, analytics]
//! steps:
//!   - event: ON_CREATE
//!   - add: late-listener
//!   - event: ON_START
//!   - remove: analytics
//!   - restore: RESUMED
//! ```
//!
//! The file extension selects the parser: `.yaml`/`.yml` or `.json`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use lifecycle_core::{Event, ObserverId, State};
use lifecycle_runtime::{Lifecycle, LifecycleConfig, ObserverRef, TransitionRecord};

/// Arguments for the `lifecycle replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Scenario file (.yaml, .yml or .json).
    pub scenario: PathBuf,

    /// Output format for the replay report.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per delivery, then state and history.
    Text,
    /// The full report as pretty-printed JSON.
    Json,
}

// ─── Scenario ────────────────────────────────────────────────────────

/// A scripted lifecycle run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Registry settings.
    #[serde(default)]
    pub config: LifecycleConfig,
    /// Recording observers registered before the first step.
    #[serde(default)]
    pub observers: Vec<String>,
    /// Steps applied in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Report a lifecycle event.
    Event(Event),
    /// Register a recording observer under this name.
    Add(String),
    /// Unregister the named observer.
    Remove(String),
    /// Restore the registry directly to a state.
    Restore(State),
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(event) => write!(f, "event {event}"),
            Self::Add(name) => write!(f, "add {name}"),
            Self::Remove(name) => write!(f, "remove {name}"),
            Self::Restore(state) => write!(f, "restore {state}"),
        }
    }
}

/// Read a scenario, picking the parser from the file extension.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario: {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML scenario: {}", path.display())),
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON scenario: {}", path.display())),
        _ => bail!(
            "unsupported scenario extension (expected .yaml, .yml or .json): {}",
            path.display()
        ),
    }
}

// ─── Report ──────────────────────────────────────────────────────────

/// One event handed to one observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Observer name from the scenario.
    pub observer: String,
    /// The delivered event.
    pub event: Event,
    /// Registry state when the callback ran.
    pub owner_state: State,
}

/// Outcome of a completed replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Owner name from the scenario config.
    pub owner: String,
    /// Registry state after the last step.
    pub final_state: State,
    /// Every delivery, in dispatch order.
    pub deliveries: Vec<Delivery>,
    /// Owner-level state moves, oldest first.
    pub history: Vec<TransitionRecord>,
}

impl ReplayReport {
    /// Human-readable rendering.
    pub fn to_text(&self) -> String {
        let mut out = format!("owner: {}\n", self.owner);
        for delivery in &self.deliveries {
            out.push_str(&format!(
                "  {:<20} {:<10} (owner {})\n",
                delivery.observer,
                delivery.event.name(),
                delivery.owner_state
            ));
        }
        out.push_str(&format!("final state: {}\n", self.final_state));
        out.push_str(&format!("history ({} records):\n", self.history.len()));
        for record in &self.history {
            let cause = record.event.map_or("restore", Event::name);
            out.push_str(&format!(
                "  {} {} -> {} via {}\n",
                record.timestamp, record.from_state, record.to_state, cause
            ));
        }
        out
    }
}

// ─── Replay ──────────────────────────────────────────────────────────

/// Apply `scenario` to a new registry.
///
/// Stops at the first failing step; the error names the step.
pub fn replay(scenario: &Scenario) -> Result<ReplayReport> {
    let lifecycle =
        Lifecycle::new(scenario.config.clone()).context("invalid scenario config")?;
    let log: Rc<RefCell<Vec<Delivery>>> = Rc::new(RefCell::new(Vec::new()));
    let mut names: HashMap<String, ObserverId> = HashMap::new();

    tracing::info!(
        owner = %scenario.config.owner,
        observers = scenario.observers.len(),
        steps = scenario.steps.len(),
        "replaying scenario"
    );

    for name in &scenario.observers {
        add_recorder(&lifecycle, &log, &mut names, name)
            .with_context(|| format!("failed to add observer {name}"))?;
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        tracing::debug!(index, %step, "applying step");
        apply(&lifecycle, &log, &mut names, step)
            .with_context(|| format!("step {} ({step}) failed", index + 1))?;
    }

    let deliveries = log.borrow().clone();
    Ok(ReplayReport {
        owner: lifecycle.owner(),
        final_state: lifecycle.current_state(),
        deliveries,
        history: lifecycle.history(),
    })
}

fn apply(
    lifecycle: &Lifecycle,
    log: &Rc<RefCell<Vec<Delivery>>>,
    names: &mut HashMap<String, ObserverId>,
    step: &Step,
) -> Result<()> {
    match step {
        Step::Event(event) => lifecycle.handle_transition(*event)?,
        Step::Restore(state) => lifecycle.set_current_state(*state)?,
        Step::Add(name) => add_recorder(lifecycle, log, names, name)?,
        Step::Remove(name) => {
            let Some(id) = names.remove(name) else {
                bail!("unknown observer: {name}");
            };
            lifecycle.remove_observer(id);
        }
    }
    Ok(())
}

fn add_recorder(
    lifecycle: &Lifecycle,
    log: &Rc<RefCell<Vec<Delivery>>>,
    names: &mut HashMap<String, ObserverId>,
    name: &str,
) -> Result<()> {
    if names.contains_key(name) {
        bail!("observer already registered: {name}");
    }
    let sink = Rc::clone(log);
    let observer_name = name.to_string();
    let observer = ObserverRef::from_fn(move |owner, event| {
        sink.borrow_mut().push(Delivery {
            observer: observer_name.clone(),
            event,
            owner_state: owner.current_state(),
        });
    });
    let id = lifecycle.add_observer(observer)?;
    names.insert(name.to_string(), id);
    Ok(())
}

/// Execute the replay subcommand.
pub fn run_replay(args: &ReplayArgs) -> Result<u8> {
    let scenario = load_scenario(&args.scenario)?;
    let report = replay(&scenario)?;
    match args.format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(0)
}

// ─── Tests ───────────────────────────────────────────────────────────

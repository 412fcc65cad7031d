//! # lifecycle-cli — Lifecycle Scenario Tooling
//!
//! Command-line front end for the lifecycle registry. Scenarios are
//! scripted as data (YAML or JSON) so that ordering questions ("what does
//! a late observer see?", "who is torn down first?") can be answered by
//! running them rather than by reading the dispatch code.
//!
//! ## Subcommands
//!
//! - `replay`: apply a scenario and report every delivered event.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live in their modules
//!   and return `anyhow::Result<u8>` exit codes.
//! - All lifecycle behaviour comes from `lifecycle-runtime`.

pub mod replay;

//! Docvet core library.
//!
//! This crate analyzes a markdown documentation tree in several passes and
//! offers guided, per-issue remediation.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Project root discovery and typed settings with defaults.
//! - `store`: Document discovery and the cached text view.
//! - `session`: `AnalysisSession`, the per-run issue aggregator.
//! - `passes`: lint, terms, viewpoints, contradictions, gaps and links.
//! - `review`: Command runner and the full-review orchestrator.
//! - `remediate`: Interactive prompt loop and fix appliers.
//! - `persist`: History, session and ignore-log files under `.docvet/`.
//! - `models`: Issue taxonomy, counters and persisted records.
//! - `output`: Human/JSON printers.
//! - `utils`: Supporting helpers.
//!
//! Note: All documentation comments are written in English by convention.
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod passes;
pub mod persist;
pub mod remediate;
pub mod review;
pub mod session;
pub mod store;
pub mod utils;

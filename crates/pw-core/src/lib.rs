//! PageWarden Core Library
//!
//! This crate provides the interception engine for the PageWarden content
//! blocker. It owns every blocking decision, while all DOM access goes
//! through narrow host traits, so the same engine runs against a browser
//! (via the wasm bindings) or against test doubles.
//!
//! # Architecture
//!
//! Rule data is compiled once into immutable [`RuleSet`]s held by a
//! [`Registry`]. At page load the host resolves its origin to a single
//! binding and builds an [`Engine`] around it; from then on every entry
//! point is synchronous and infallible from the host's point of view. Bad
//! rules are skipped at load and host errors are contained per item, while
//! a decision to cancel a navigation is never rolled back.
//!
//! # Modules
//!
//! - `types`: shared type definitions (events, verdicts, protection flags)
//! - `url`: host/scheme string helpers without allocations
//! - `rules`: RuleSet compilation, the registry, and site resolution
//! - `host`: traits the embedding host implements (DOM, globals, events)
//! - `cosmetic`: selector-driven hide/remove filtering
//! - `nav`: navigation screening across click/open/assign/submit surfaces
//! - `patch`: global-function stubbing and script-source screening
//! - `watch`: mutation-scoped incremental sweeps
//! - `stats`: block counters, the event log, and notification dispatch
//! - `engine`: composition root tying a resolved RuleSet to the host

pub mod types;
pub mod url;
pub mod rules;
pub mod host;
pub mod stats;
pub mod cosmetic;
pub mod nav;
pub mod patch;
pub mod watch;
pub mod engine;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use types::{BlockCategory, BlockEvent, NavDisposition, NavSurface, PatchOutcome, Protections, ScriptVerdict, Severity};
pub use rules::{Registry, RuleError, RuleSet, RuleSetBuilder};
pub use host::{AnchorInfo, DomError, DomHost, GlobalsHost, NavEvent};
pub use stats::{Clock, Presenter, PresenterError, StatsSink, StatsSnapshot, SystemClock};
pub use engine::Engine;

//! PageWarden Rule Compiler
//!
//! This crate loads JSON rule files into the registry pw-core consumes.

pub mod schema;
pub mod compile;
pub mod builtin;

pub use builtin::{builtin_registry, BUILTIN_RULES};
pub use compile::{compile_ruleset, load_rules, load_rules_path, LoadError, LoadReport, RejectedRule};
pub use schema::{RuleSetDef, RulesFile};

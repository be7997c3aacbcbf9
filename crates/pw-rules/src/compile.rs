//! Rule file compilation
//!
//! Turns parsed [`RuleSetDef`]s into compiled `pw-core` rule sets. Selector
//! syntax is checked here with `scraper` so a rule file author hears about a
//! typo at load instead of a silent no-op sweep at runtime. Rejection stays
//! per-entry: one bad selector never takes down its rule set.

use std::path::Path;

use scraper::Selector;

use pw_core::rules::{Registry, RuleError, RuleSet};
use pw_core::types::Protections;

use crate::schema::{RuleSetDef, RulesFile};

/// Error type for whole-file loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot read rule file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed rule file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Rule file defines no rule sets")]
    NoRuleSets,
}

/// One rejected entry, attributed to its rule set.
#[derive(Debug)]
pub struct RejectedRule {
    pub set_id: String,
    pub error: RuleError,
}

/// What a load did: sets compiled, entries rejected.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub sets: usize,
    pub rejected: Vec<RejectedRule>,
}

/// Compile one rule set definition.
///
/// Selectors are syntax-checked before the core builder runs; everything
/// else (trimming, regex compilation, scheme normalization) is the
/// builder's job.
pub fn compile_ruleset(def: &RuleSetDef) -> (RuleSet, Vec<RuleError>) {
    let mut errors = Vec::new();
    let mut builder = RuleSet::builder(&def.id);

    for domain in &def.match_domains {
        builder = builder.match_domain(domain);
    }

    for selector in &def.selectors {
        let trimmed = selector.trim();
        if !trimmed.is_empty() {
            if let Err(err) = Selector::parse(trimmed) {
                errors.push(RuleError::Selector {
                    selector: trimmed.to_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        }
        builder = builder.selector(selector);
    }

    for scheme in &def.schemes {
        builder = builder.scheme(scheme);
    }
    for pattern in &def.patterns {
        builder = builder.pattern(pattern);
    }
    for function in &def.functions {
        builder = builder.function(function);
    }

    if let Some(names) = &def.protections {
        let mut protections = Protections::empty();
        for name in names {
            match Protections::from_name(name) {
                Some(flag) => protections |= flag,
                None => errors.push(RuleError::UnknownProtection(name.clone())),
            }
        }
        builder = builder.protections(protections);
    }

    let (set, mut build_errors) = builder.build();
    errors.append(&mut build_errors);
    (set, errors)
}

/// Load a rule file from JSON text.
///
/// Structural problems fail the whole load; entry problems are collected in
/// the report and the rest of the file still loads. A file with neither a
/// default nor any site set is refused.
pub fn load_rules(text: &str) -> Result<(Registry, LoadReport), LoadError> {
    let file: RulesFile = serde_json::from_str(text)?;
    if file.default.is_none() && file.sites.is_empty() {
        return Err(LoadError::NoRuleSets);
    }

    let mut report = LoadReport::default();

    let default_set = match &file.default {
        Some(def) => {
            let (set, errors) = compile_ruleset(def);
            collect_rejections(&mut report, &set.id, errors);
            report.sets += 1;
            set
        }
        None => RuleSet::empty("default"),
    };

    let mut registry = Registry::new(default_set);
    for def in &file.sites {
        let (set, errors) = compile_ruleset(def);
        collect_rejections(&mut report, &set.id, errors);
        report.sets += 1;
        registry.register(set);
    }

    Ok((registry, report))
}

/// Load a rule file from disk.
pub fn load_rules_path(path: &Path) -> Result<(Registry, LoadReport), LoadError> {
    let text = std::fs::read_to_string(path)?;
    load_rules(&text)
}

fn collect_rejections(report: &mut LoadReport, set_id: &str, errors: Vec<RuleError>) {
    for error in errors {
        log::warn!("Rejected rule in {set_id}: {error}");
        report.rejected.push(RejectedRule {
            set_id: set_id.to_string(),
            error,
        });
    }
}

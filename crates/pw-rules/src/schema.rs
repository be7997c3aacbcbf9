//! JSON rule file schema
//!
//! The on-disk format is one JSON object with a `default` rule set and an
//! ordered `sites` list. All entry lists are optional; protections default
//! to everything on.

use serde::{Deserialize, Serialize};

/// A whole rule file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesFile {
    /// Fallback set for origins no site set claims
    #[serde(default)]
    pub default: Option<RuleSetDef>,
    /// Site sets in priority order
    #[serde(default)]
    pub sites: Vec<RuleSetDef>,
}

/// One rule set as written in a rule file, uncompiled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetDef {
    pub id: String,
    /// Hostnames this set claims, exact or by stem
    #[serde(default)]
    pub match_domains: Vec<String>,
    /// CSS selectors to hide and remove
    #[serde(default)]
    pub selectors: Vec<String>,
    /// URL scheme prefixes to suppress
    #[serde(default)]
    pub schemes: Vec<String>,
    /// Keyword regexes over URLs, link text and script source
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Page globals to stub
    #[serde(default)]
    pub functions: Vec<String>,
    /// Protection names; absent means all
    #[serde(default)]
    pub protections: Option<Vec<String>>,
}

//! Rule sets, the registry, and site resolution
//!
//! A [`RuleSet`] is the unit of configuration: everything the engine knows
//! about one site (or the default) lives in one immutable value, compiled
//! once at registration. The [`Registry`] holds them in registration order
//! and resolves a page origin to exactly one binding.

use std::sync::Arc;

use regex::Regex;

use crate::types::Protections;
use crate::url::{domain_stem, find_ignore_ascii_case, has_prefix_ignore_case, origin_host};

// =============================================================================
// Errors
// =============================================================================

/// Error type for rule compilation.
///
/// Each value describes one rejected entry; the rest of the RuleSet still
/// loads.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Empty selector")]
    EmptySelector,
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Empty scheme")]
    EmptyScheme,
    #[error("Empty function name")]
    EmptyFunction,
    #[error("Empty match domain")]
    EmptyDomain,
    #[error("Unknown protection: {0}")]
    UnknownProtection(String),
}

// =============================================================================
// RuleSet
// =============================================================================

/// One compiled, immutable rule set.
///
/// Instances only come out of [`RuleSetBuilder::build`] and are shared as
/// `Arc<RuleSet>`; nothing mutates them after registration.
#[derive(Debug)]
pub struct RuleSet {
    /// Stable identifier, used in logs and reports
    pub id: String,
    /// Domains this set applies to, in declaration order
    pub match_domains: Vec<String>,
    /// CSS selectors for the cosmetic filter
    pub selectors: Vec<String>,
    /// Blocked scheme prefixes, stored lowercase
    pub schemes: Vec<String>,
    /// Compiled keyword patterns, tested against URLs and link text
    pub patterns: Vec<Regex>,
    /// Global function names to stub
    pub functions: Vec<String>,
    /// Which engine features this set arms
    pub protections: Protections,
}

impl RuleSet {
    /// Builder for a set with the given id.
    pub fn builder(id: &str) -> RuleSetBuilder {
        RuleSetBuilder::new(id)
    }

    /// An empty set: matches nothing, blocks nothing.
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            match_domains: Vec::new(),
            selectors: Vec::new(),
            schemes: Vec::new(),
            patterns: Vec::new(),
            functions: Vec::new(),
            protections: Protections::ALL,
        }
    }

    /// The blocked scheme prefix `url` starts with, if any.
    #[inline]
    pub fn blocked_scheme(&self, url: &str) -> Option<&str> {
        self.schemes
            .iter()
            .find(|scheme| has_prefix_ignore_case(url, scheme))
            .map(|scheme| scheme.as_str())
    }

    /// The keyword pattern matching `haystack`, if any.
    #[inline]
    pub fn blocked_pattern(&self, haystack: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| pattern.is_match(haystack))
            .map(|pattern| pattern.as_str())
    }

    /// Whether this set stubs the named global.
    #[inline]
    pub fn blocks_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f == name)
    }

    /// Whether a protection is armed for this set.
    #[inline]
    pub fn protects(&self, protection: Protections) -> bool {
        self.protections.contains(protection)
    }
}

// =============================================================================
// RuleSet Builder
// =============================================================================

/// Accumulates raw rule entries and compiles them into a [`RuleSet`].
///
/// Compilation is per-entry tolerant: a bad regex or an empty selector is
/// reported in the error list and dropped, the rest of the set still builds.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    id: String,
    match_domains: Vec<String>,
    selectors: Vec<String>,
    schemes: Vec<String>,
    patterns: Vec<String>,
    functions: Vec<String>,
    protections: Option<Protections>,
}

impl RuleSetBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn match_domain(mut self, domain: &str) -> Self {
        self.match_domains.push(domain.to_string());
        self
    }

    pub fn selector(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn scheme(mut self, scheme: &str) -> Self {
        self.schemes.push(scheme.to_string());
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.patterns.push(pattern.to_string());
        self
    }

    pub fn function(mut self, name: &str) -> Self {
        self.functions.push(name.to_string());
        self
    }

    pub fn protections(mut self, protections: Protections) -> Self {
        self.protections = Some(protections);
        self
    }

    /// Compile the accumulated entries.
    ///
    /// Always yields a usable set; rejected entries come back alongside it.
    pub fn build(self) -> (RuleSet, Vec<RuleError>) {
        let mut errors = Vec::new();

        let mut match_domains = Vec::with_capacity(self.match_domains.len());
        for domain in self.match_domains {
            let domain = domain.trim();
            if domain.is_empty() {
                errors.push(RuleError::EmptyDomain);
                continue;
            }
            match_domains.push(domain.to_ascii_lowercase());
        }

        let mut selectors = Vec::with_capacity(self.selectors.len());
        for selector in self.selectors {
            let selector = selector.trim();
            if selector.is_empty() {
                errors.push(RuleError::EmptySelector);
                continue;
            }
            selectors.push(selector.to_string());
        }

        let mut schemes = Vec::with_capacity(self.schemes.len());
        for scheme in self.schemes {
            let scheme = scheme.trim();
            if scheme.is_empty() {
                errors.push(RuleError::EmptyScheme);
                continue;
            }
            schemes.push(scheme.to_ascii_lowercase());
        }

        let mut patterns = Vec::with_capacity(self.patterns.len());
        for pattern in self.patterns {
            match Regex::new(&pattern) {
                Ok(compiled) => patterns.push(compiled),
                Err(source) => errors.push(RuleError::Pattern { pattern, source }),
            }
        }

        let mut functions = Vec::with_capacity(self.functions.len());
        for name in self.functions {
            let name = name.trim();
            if name.is_empty() {
                errors.push(RuleError::EmptyFunction);
                continue;
            }
            functions.push(name.to_string());
        }

        let set = RuleSet {
            id: self.id,
            match_domains,
            selectors,
            schemes,
            patterns,
            functions,
            protections: self.protections.unwrap_or(Protections::ALL),
        };

        (set, errors)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// All registered rule sets plus the default, in registration order.
#[derive(Debug)]
pub struct Registry {
    sets: Vec<Arc<RuleSet>>,
    default_set: Arc<RuleSet>,
}

impl Registry {
    /// Create a registry around its default set.
    pub fn new(default_set: RuleSet) -> Self {
        Self {
            sets: Vec::new(),
            default_set: Arc::new(default_set),
        }
    }

    /// Register a site set. Order is significant: earlier registrations win
    /// resolution ties.
    pub fn register(&mut self, set: RuleSet) {
        self.sets.push(Arc::new(set));
    }

    /// Number of registered site sets (the default not included).
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The default set.
    pub fn default_set(&self) -> &Arc<RuleSet> {
        &self.default_set
    }

    /// Registered site sets in registration order.
    pub fn sets(&self) -> impl Iterator<Item = &Arc<RuleSet>> {
        self.sets.iter()
    }

    /// Resolve a page origin to its rule set.
    ///
    /// Two passes over registration order: exact hostname match first, then
    /// stem containment (the registered domain minus "www." and its suffix
    /// must appear in the origin host, so "weibo.com" covers "m.weibo.cn").
    /// Falls back to the default set; never fails.
    pub fn resolve(&self, origin: &str) -> Arc<RuleSet> {
        let host = origin_host(origin);

        for set in &self.sets {
            for domain in &set.match_domains {
                if domain.eq_ignore_ascii_case(host) {
                    return set.clone();
                }
            }
        }

        for set in &self.sets {
            for domain in &set.match_domains {
                let stem = domain_stem(domain);
                if !stem.is_empty() && find_ignore_ascii_case(host, stem).is_some() {
                    return set.clone();
                }
            }
        }

        self.default_set.clone()
    }
}

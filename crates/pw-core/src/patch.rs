//! Function stubbing and script screening
//!
//! Two related defenses. Named page globals (`openApp` and friends) get
//! wrapped in inert stubs so invoking them reports a block instead of
//! launching anything. Script element creation gets hooked so source text
//! and URLs are screened against the rule set before the script runs.

use std::collections::HashSet;
use std::sync::Arc;

use crate::host::GlobalsHost;
use crate::rules::RuleSet;
use crate::stats::StatsSink;
use crate::types::{BlockCategory, PatchOutcome, Protections, ScriptVerdict};

/// Length cap for the source excerpt recorded with a screened-out script.
const SOURCE_EXCERPT_CHARS: usize = 100;

/// Installs and tracks function stubs for the bound rule set.
#[derive(Debug)]
pub struct FunctionPatcher {
    set: Arc<RuleSet>,
    /// Names we wrapped, in install order; restore unwraps exactly these
    wrapped: Vec<String>,
    /// Names found already wrapped, logged once each
    conflicts: HashSet<String>,
    script_hook: bool,
}

impl FunctionPatcher {
    pub fn new(set: Arc<RuleSet>) -> Self {
        Self {
            set,
            wrapped: Vec::new(),
            conflicts: HashSet::new(),
            script_hook: false,
        }
    }

    /// Names currently wrapped by this patcher.
    pub fn wrapped(&self) -> &[String] {
        &self.wrapped
    }

    /// Stub the set's functions and hook script creation if the set has
    /// anything to screen scripts against.
    ///
    /// Returns the number of stubs newly installed. Re-running is a no-op
    /// for names already wrapped here; a wrapper someone else installed is
    /// left in place and noted once.
    pub fn install<H: GlobalsHost>(&mut self, host: &mut H) -> usize {
        if !self.set.protects(Protections::FUNCTIONS) {
            return 0;
        }

        let mut installed = 0;
        for name in &self.set.functions {
            if self.wrapped.iter().any(|w| w == name) {
                continue;
            }
            match host.wrap_callable(name) {
                Ok(PatchOutcome::Installed) => {
                    self.wrapped.push(name.clone());
                    installed += 1;
                }
                Ok(PatchOutcome::AlreadyWrapped) => {
                    if self.conflicts.insert(name.clone()) {
                        log::warn!("Global already wrapped, leaving it: {name}");
                    }
                }
                Ok(PatchOutcome::Missing) => log::debug!("Global not present: {name}"),
                Err(err) => log::warn!("Stub install failed for {name}: {err}"),
            }
        }

        let screens_scripts = !self.set.patterns.is_empty() || !self.set.schemes.is_empty();
        if screens_scripts && !self.script_hook {
            match host.hook_script_creation() {
                Ok(PatchOutcome::Installed) => self.script_hook = true,
                Ok(_) => {}
                Err(err) => log::warn!("Script hook failed: {err}"),
            }
        }

        installed
    }

    /// Unwrap everything this patcher installed.
    pub fn restore<H: GlobalsHost>(&mut self, host: &mut H) {
        for name in self.wrapped.drain(..) {
            if let Err(err) = host.unwrap_callable(&name) {
                log::debug!("Unwrap failed for {name}: {err}");
            }
        }
        if self.script_hook {
            if let Err(err) = host.unhook_script_creation() {
                log::debug!("Script unhook failed: {err}");
            }
            self.script_hook = false;
        }
        self.conflicts.clear();
    }

    /// A stub fired: record the block. The stub itself already returned its
    /// inert value on the host side.
    pub fn on_blocked_call(&self, name: &str, stats: &mut StatsSink) {
        log::debug!("Stubbed call: {name}");
        stats.record(BlockCategory::Script, name);
    }

    /// Screen inline script source. Discard on any keyword pattern match.
    pub fn screen_source(&self, source: &str, stats: &mut StatsSink) -> ScriptVerdict {
        if !self.set.protects(Protections::FUNCTIONS) {
            return ScriptVerdict::Proceed;
        }
        if self.set.blocked_pattern(source).is_some() {
            stats.record(BlockCategory::Script, source_excerpt(source));
            return ScriptVerdict::Discard;
        }
        ScriptVerdict::Proceed
    }

    /// Screen a script URL. Discard on a blocked scheme or keyword match.
    pub fn screen_url(&self, url: &str, stats: &mut StatsSink) -> ScriptVerdict {
        if !self.set.protects(Protections::FUNCTIONS) {
            return ScriptVerdict::Proceed;
        }
        if self.set.blocked_scheme(url).is_some() || self.set.blocked_pattern(url).is_some() {
            stats.record(BlockCategory::Script, url);
            return ScriptVerdict::Discard;
        }
        ScriptVerdict::Proceed
    }
}

/// First 100 characters of the source, for the event log.
fn source_excerpt(source: &str) -> &str {
    match source.char_indices().nth(SOURCE_EXCERPT_CHARS) {
        Some((index, _)) => &source[..index],
        None => source,
    }
}

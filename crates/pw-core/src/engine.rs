//! The per-page engine
//!
//! One [`Engine`] per page. Construction resolves the origin against the
//! registry and binds the winning rule set into every component; after that
//! the engine is self-contained and the registry is out of the picture.
//! Hosts drive it through narrow entry points (activation, the navigation
//! surfaces, mutation batches, script screening) and none of them can fail
//! outward: rule misses proceed, host errors degrade to log lines.

use std::sync::Arc;

use crate::cosmetic::CosmeticFilter;
use crate::host::{DomHost, GlobalsHost, NavEvent};
use crate::nav::NavGuard;
use crate::patch::FunctionPatcher;
use crate::rules::{Registry, RuleSet};
use crate::stats::{Clock, Presenter, StatsSink, StatsSnapshot};
use crate::types::{BlockEvent, NavDisposition, NavSurface, ScriptVerdict, Severity};
use crate::watch::MutationWatcher;

/// Interception engine bound to one page origin.
pub struct Engine {
    origin: String,
    binding: Arc<RuleSet>,
    cosmetic: CosmeticFilter,
    guard: NavGuard,
    patcher: FunctionPatcher,
    watcher: MutationWatcher,
    stats: StatsSink,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("origin", &self.origin)
            .field("binding", &self.binding.id)
            .finish()
    }
}

impl Engine {
    /// Build an engine for a page. Resolution never fails; an unknown
    /// origin gets the default set.
    pub fn new(registry: &Registry, origin: &str) -> Self {
        let binding = registry.resolve(origin);
        log::debug!("Bound {origin} to rule set {}", binding.id);
        Self {
            origin: origin.to_string(),
            binding: binding.clone(),
            cosmetic: CosmeticFilter::new(binding.clone()),
            guard: NavGuard::new(binding.clone()),
            patcher: FunctionPatcher::new(binding.clone()),
            watcher: MutationWatcher::new(binding),
            stats: StatsSink::new(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The rule set this page resolved to.
    pub fn binding(&self) -> &Arc<RuleSet> {
        &self.binding
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.stats.set_clock(clock);
    }

    pub fn set_presenter(&mut self, presenter: Option<Box<dyn Presenter>>) {
        self.stats.set_presenter(presenter);
    }

    pub fn set_notify_blocks(&mut self, enabled: bool) {
        self.stats.set_notify_blocks(enabled);
    }

    /// The hide stylesheet for this page, for hosts that inject it
    /// themselves at document-start.
    pub fn hide_css(&self) -> String {
        self.cosmetic.stylesheet()
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Full activation: cosmetic pass plus function patches.
    ///
    /// Idempotent; returns the number of elements removed.
    pub fn activate<D, G>(&mut self, dom: &mut D, globals: &mut G) -> usize
    where
        D: DomHost,
        G: GlobalsHost,
    {
        let removed = self.apply_cosmetics(dom);
        let installed = self.install_patches(globals);
        log::debug!(
            "Activated {}: {removed} elements removed, {installed} stubs installed",
            self.origin
        );
        removed
    }

    /// Run the cosmetic pass by itself.
    pub fn apply_cosmetics<D: DomHost>(&mut self, dom: &mut D) -> usize {
        self.cosmetic.apply(dom, &mut self.stats)
    }

    /// Install function stubs and the script hook by themselves.
    pub fn install_patches<G: GlobalsHost>(&mut self, globals: &mut G) -> usize {
        self.patcher.install(globals)
    }

    /// Unwrap everything this engine wrapped and reset patch state, leaving
    /// the stats alone.
    pub fn restore_patches<G: GlobalsHost>(&mut self, globals: &mut G) {
        self.patcher.restore(globals);
    }

    /// Full teardown: undo the patches and forget this page's stats.
    pub fn deactivate<G: GlobalsHost>(&mut self, globals: &mut G) {
        self.restore_patches(globals);
        self.stats.clear();
    }

    // =========================================================================
    // Navigation surfaces
    // =========================================================================

    pub fn on_document_click<D: DomHost, E: NavEvent>(
        &mut self,
        dom: &D,
        event: &mut E,
        target: &D::Node,
    ) -> NavDisposition {
        self.guard.on_click(dom, event, target, &mut self.stats)
    }

    pub fn on_window_open(&mut self, url: Option<&str>) -> NavDisposition {
        self.guard.on_window_open(url, &mut self.stats)
    }

    pub fn on_location_assign(&mut self, url: &str) -> NavDisposition {
        self.guard.on_location_assign(url, &mut self.stats)
    }

    pub fn on_form_submit<E: NavEvent>(&mut self, action: &str, event: &mut E) -> NavDisposition {
        self.guard.on_form_submit(action, event, &mut self.stats)
    }

    /// Screen a navigation the host has already resolved to a URL (and,
    /// for clicks, the link text). The host cancels its own event.
    pub fn screen_navigation(
        &mut self,
        surface: NavSurface,
        url: &str,
        text: Option<&str>,
    ) -> NavDisposition {
        self.guard.screen_surface(surface, url, text, &mut self.stats)
    }

    // =========================================================================
    // Scripts and dynamic content
    // =========================================================================

    /// A stubbed global was invoked on the page.
    pub fn on_blocked_call(&mut self, name: &str) {
        self.patcher.on_blocked_call(name, &mut self.stats);
    }

    pub fn screen_script_source(&mut self, source: &str) -> ScriptVerdict {
        self.patcher.screen_source(source, &mut self.stats)
    }

    pub fn screen_script_url(&mut self, url: &str) -> ScriptVerdict {
        self.patcher.screen_url(url, &mut self.stats)
    }

    /// Elements added after activation, from the host's mutation observer.
    pub fn on_mutation_batch<D: DomHost>(&mut self, dom: &mut D, added: &[D::Node]) -> usize {
        self.watcher
            .on_batch(dom, added, &self.cosmetic, &mut self.stats)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn events(&self) -> &[BlockEvent] {
        self.stats.events()
    }

    /// Push a message through the configured presenter.
    pub fn notify(&mut self, message: &str, severity: Severity) {
        self.stats.notify(message, severity);
    }
}

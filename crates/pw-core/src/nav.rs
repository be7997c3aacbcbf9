//! Navigation guard: scheme and keyword screening across four surfaces
//!
//! Anchor clicks, `window.open`, location assignment and form submission all
//! funnel into one screening routine. Unknown URLs proceed; a suppression
//! requires a positive scheme or keyword match. Click and submit run in the
//! capture phase on the host side, so an event another handler already
//! cancelled is left alone.

use std::sync::Arc;

use crate::host::{DomHost, NavEvent};
use crate::rules::RuleSet;
use crate::stats::StatsSink;
use crate::types::{BlockCategory, NavDisposition, NavSurface, Protections};

/// Why a navigation was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason<'a> {
    /// URL starts with this blocked scheme prefix
    Scheme(&'a str),
    /// URL or link text matched this keyword pattern
    Keyword(&'a str),
}

/// Screens navigations against the bound rule set.
#[derive(Debug)]
pub struct NavGuard {
    set: Arc<RuleSet>,
}

impl NavGuard {
    pub fn new(set: Arc<RuleSet>) -> Self {
        Self { set }
    }

    /// Pure screening: scheme prefix first, then keyword patterns over the
    /// URL, then over the link text if given.
    pub fn screen(&self, url: &str, text: Option<&str>) -> Option<BlockReason<'_>> {
        if !self.set.protects(Protections::SCHEMES) {
            return None;
        }
        if let Some(scheme) = self.set.blocked_scheme(url) {
            return Some(BlockReason::Scheme(scheme));
        }
        if let Some(pattern) = self.set.blocked_pattern(url) {
            return Some(BlockReason::Keyword(pattern));
        }
        if let Some(text) = text {
            if let Some(pattern) = self.set.blocked_pattern(text) {
                return Some(BlockReason::Keyword(pattern));
            }
        }
        None
    }

    /// Screen with surface attribution, recording a block on Suppress.
    /// Hosts that resolve the anchor themselves call this directly.
    pub fn screen_surface(
        &self,
        surface: NavSurface,
        url: &str,
        text: Option<&str>,
        stats: &mut StatsSink,
    ) -> NavDisposition {
        if url.is_empty() {
            return NavDisposition::Proceed;
        }
        match self.screen(url, text) {
            Some(reason) => {
                log::debug!("Suppressed {} navigation to {url}: {reason:?}", surface.as_str());
                stats.record(BlockCategory::Scheme, url);
                NavDisposition::Suppress
            }
            None => NavDisposition::Proceed,
        }
    }

    /// Document-level click, capture phase. Resolves the nearest enclosing
    /// anchor of the click target and screens its URL and text.
    pub fn on_click<H: DomHost, E: NavEvent>(
        &self,
        host: &H,
        event: &mut E,
        target: &H::Node,
        stats: &mut StatsSink,
    ) -> NavDisposition {
        if event.cancelled() {
            return NavDisposition::Proceed;
        }
        let anchor = match host.closest_anchor(target) {
            Some(anchor) => anchor,
            None => return NavDisposition::Proceed,
        };
        let disposition =
            self.screen_surface(NavSurface::AnchorClick, &anchor.href, Some(&anchor.text), stats);
        if disposition == NavDisposition::Suppress {
            event.prevent_default();
            event.stop_propagation();
        }
        disposition
    }

    /// `window.open` interception. The patched opener returns null on
    /// Suppress instead of a window handle.
    pub fn on_window_open(&self, url: Option<&str>, stats: &mut StatsSink) -> NavDisposition {
        match url {
            Some(url) => self.screen_surface(NavSurface::WindowOpen, url, None, stats),
            None => NavDisposition::Proceed,
        }
    }

    /// Programmatic location assignment. On Suppress the host discards the
    /// write and the page stays put.
    pub fn on_location_assign(&self, url: &str, stats: &mut StatsSink) -> NavDisposition {
        self.screen_surface(NavSurface::LocationAssign, url, None, stats)
    }

    /// Form submission, capture phase, screening the form action.
    pub fn on_form_submit<E: NavEvent>(
        &self,
        action: &str,
        event: &mut E,
        stats: &mut StatsSink,
    ) -> NavDisposition {
        if event.cancelled() {
            return NavDisposition::Proceed;
        }
        let disposition = self.screen_surface(NavSurface::FormSubmit, action, None, stats);
        if disposition == NavDisposition::Suppress {
            event.prevent_default();
        }
        disposition
    }
}

//! Dynamic content: re-screening mutation batches
//!
//! Hosts observe childList mutations over the whole document and hand the
//! added element nodes here. Each added subtree gets the same cosmetic
//! sweep the activation pass ran, plus a link pass that disarms anchors
//! whose URL carries a blocked scheme, so late-injected content gets no
//! grace period.

use std::sync::Arc;

use crate::cosmetic::CosmeticFilter;
use crate::host::DomHost;
use crate::rules::RuleSet;
use crate::stats::StatsSink;
use crate::types::{BlockCategory, Protections};

/// Screens subtrees added after activation.
#[derive(Debug)]
pub struct MutationWatcher {
    set: Arc<RuleSet>,
}

impl MutationWatcher {
    pub fn new(set: Arc<RuleSet>) -> Self {
        Self { set }
    }

    /// Handle one mutation batch.
    ///
    /// Sweeps are scoped to the added subtrees, never the whole document.
    /// Returns elements removed plus links disarmed.
    pub fn on_batch<H: DomHost>(
        &self,
        host: &mut H,
        added: &[H::Node],
        cosmetic: &CosmeticFilter,
        stats: &mut StatsSink,
    ) -> usize {
        if !self.set.protects(Protections::DYNAMIC) || added.is_empty() {
            return 0;
        }

        let mut acted = 0;
        for node in added {
            if self.set.protects(Protections::ELEMENTS) {
                acted += cosmetic.sweep(host, node, stats);
            }
            if self.set.protects(Protections::SCHEMES) {
                acted += self.disarm_links(host, node, stats);
            }
        }
        acted
    }

    /// Neutralize anchors under `root` whose URL starts with a blocked
    /// scheme. The host rewrites the href so the link stays visible but
    /// goes nowhere.
    fn disarm_links<H: DomHost>(
        &self,
        host: &mut H,
        root: &H::Node,
        stats: &mut StatsSink,
    ) -> usize {
        let anchors = match host.query(root, "a") {
            Ok(anchors) => anchors,
            Err(err) => {
                log::debug!("Anchor query failed: {err}");
                return 0;
            }
        };

        let mut disarmed = 0;
        for anchor in &anchors {
            let Some(info) = host.anchor_target(anchor) else {
                continue;
            };
            if self.set.blocked_scheme(&info.href).is_none() {
                continue;
            }
            match host.disarm_link(anchor) {
                Ok(true) => {
                    disarmed += 1;
                    stats.record(BlockCategory::Scheme, info.href);
                }
                Ok(false) => {}
                Err(err) => log::debug!("Disarm failed: {err}"),
            }
        }
        disarmed
    }
}

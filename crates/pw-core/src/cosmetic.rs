//! Cosmetic filtering: hide matching elements, then remove them
//!
//! Two phases per activation. A generated stylesheet goes in first so
//! matches vanish before any DOM walk, then a removal sweep detaches them.
//! The same sweep runs again over mutation subtrees, so selectors are
//! matched close to where content appeared instead of over the whole
//! document.

use std::sync::Arc;

use crate::host::DomHost;
use crate::rules::RuleSet;
use crate::stats::StatsSink;
use crate::types::{BlockCategory, Protections};

/// Fixed element id for the injected hide stylesheet. Hosts replace the
/// content under this id rather than append, so re-activation never stacks
/// duplicate style elements.
pub const STYLE_ELEMENT_ID: &str = "pw-hide-style";

/// Removes elements matching the bound rule set's selectors.
#[derive(Debug)]
pub struct CosmeticFilter {
    set: Arc<RuleSet>,
    injected: Option<String>,
}

impl CosmeticFilter {
    pub fn new(set: Arc<RuleSet>) -> Self {
        Self {
            set,
            injected: None,
        }
    }

    /// The hide stylesheet for the bound set: one `display: none` rule per
    /// selector.
    pub fn stylesheet(&self) -> String {
        let mut css = String::new();
        for selector in &self.set.selectors {
            css.push_str(selector);
            css.push_str(" { display: none !important; }\n");
        }
        css
    }

    /// Hide then remove across the whole document.
    ///
    /// Returns the number of elements detached. Idempotent: the stylesheet
    /// is only re-sent when its content changed, and already-detached
    /// elements are not counted again.
    pub fn apply<H: DomHost>(&mut self, host: &mut H, stats: &mut StatsSink) -> usize {
        if !self.set.protects(Protections::ELEMENTS) || self.set.selectors.is_empty() {
            return 0;
        }
        self.inject(host);
        let root = host.document_root();
        self.sweep(host, &root, stats)
    }

    fn inject<H: DomHost>(&mut self, host: &mut H) {
        let css = self.stylesheet();
        if self.injected.as_deref() == Some(css.as_str()) {
            return;
        }
        match host.inject_style(STYLE_ELEMENT_ID, &css) {
            Ok(()) => self.injected = Some(css),
            // Removal still runs; hiding is the best-effort fast path.
            Err(err) => log::warn!("Stylesheet injection failed: {err}"),
        }
    }

    /// Removal sweep over one subtree.
    ///
    /// Selector failures skip that selector, detach failures skip that
    /// node; the sweep always finishes.
    pub fn sweep<H: DomHost>(
        &self,
        host: &mut H,
        root: &H::Node,
        stats: &mut StatsSink,
    ) -> usize {
        let mut removed = 0;
        for selector in &self.set.selectors {
            let nodes = match host.query(root, selector) {
                Ok(nodes) => nodes,
                Err(err) => {
                    log::warn!("Query failed: {err}");
                    continue;
                }
            };
            for node in &nodes {
                match host.detach(node) {
                    Ok(true) => {
                        removed += 1;
                        stats.record(BlockCategory::Element, selector.clone());
                    }
                    Ok(false) => {}
                    Err(err) => log::debug!("Detach failed: {err}"),
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDom;

    fn filter(selectors: &[&str]) -> CosmeticFilter {
        let mut builder = RuleSet::builder("test");
        for selector in selectors {
            builder = builder.selector(selector);
        }
        let (set, errors) = builder.build();
        assert!(errors.is_empty());
        CosmeticFilter::new(Arc::new(set))
    }

    #[test]
    fn hides_then_removes_matching_elements() {
        let mut dom = FakeDom::new();
        let banner = dom.classed(0, "div", "app-banner");
        let popup = dom.classed(0, "div", "app-popup");
        let content = dom.classed(0, "div", "article");

        let mut filter = filter(&[".app-banner", ".app-popup"]);
        let mut stats = StatsSink::new();
        let removed = filter.apply(&mut dom, &mut stats);

        assert_eq!(removed, 2);
        assert!(!dom.is_attached(banner));
        assert!(!dom.is_attached(popup));
        assert!(dom.is_attached(content));
        assert_eq!(stats.snapshot().elements, 2);
        assert_eq!(
            dom.styles(),
            &[(
                STYLE_ELEMENT_ID.to_string(),
                ".app-banner { display: none !important; }\n.app-popup { display: none !important; }\n"
                    .to_string()
            )]
        );
    }

    #[test]
    fn one_selector_counts_every_match() {
        let mut dom = FakeDom::new();
        let ads: Vec<usize> = (0..3).map(|_| dom.classed(0, "div", "ad")).collect();

        let mut filter = filter(&[".ad"]);
        let mut stats = StatsSink::new();
        assert_eq!(filter.apply(&mut dom, &mut stats), 3);
        for ad in ads {
            assert!(!dom.is_attached(ad));
        }
        assert_eq!(stats.snapshot().elements, 3);
    }

    #[test]
    fn reapply_neither_reinjects_nor_recounts() {
        let mut dom = FakeDom::new();
        dom.classed(0, "div", "app-banner");

        let mut filter = filter(&[".app-banner"]);
        let mut stats = StatsSink::new();
        assert_eq!(filter.apply(&mut dom, &mut stats), 1);
        assert_eq!(filter.apply(&mut dom, &mut stats), 0);

        assert_eq!(dom.style_injections, 1);
        assert_eq!(stats.snapshot().elements, 1);
    }

    #[test]
    fn rejected_selector_does_not_stop_the_sweep() {
        let mut dom = FakeDom::new();
        let bad = dom.classed(0, "div", "bad");
        let good = dom.classed(0, "div", "good");
        dom.reject_selector(".bad");

        let mut filter = filter(&[".bad", ".good"]);
        let mut stats = StatsSink::new();
        let removed = filter.apply(&mut dom, &mut stats);

        assert_eq!(removed, 1);
        assert!(dom.is_attached(bad));
        assert!(!dom.is_attached(good));
        assert_eq!(stats.snapshot().elements, 1);
    }

    #[test]
    fn failed_detach_skips_that_node() {
        let mut dom = FakeDom::new();
        let stuck = dom.classed(0, "div", "app-banner");
        let loose = dom.classed(0, "div", "app-banner");
        dom.fail_detach(stuck);

        let mut filter = filter(&[".app-banner"]);
        let mut stats = StatsSink::new();
        assert_eq!(filter.apply(&mut dom, &mut stats), 1);
        assert!(dom.is_attached(stuck));
        assert!(!dom.is_attached(loose));
    }

    #[test]
    fn style_failure_still_removes() {
        let mut dom = FakeDom::new();
        let banner = dom.classed(0, "div", "app-banner");
        dom.fail_styles();

        let mut filter = filter(&[".app-banner"]);
        let mut stats = StatsSink::new();
        assert_eq!(filter.apply(&mut dom, &mut stats), 1);
        assert!(!dom.is_attached(banner));
        assert!(dom.styles().is_empty());
    }

    #[test]
    fn disabled_elements_protection_is_inert() {
        let mut dom = FakeDom::new();
        let banner = dom.classed(0, "div", "app-banner");

        let (set, _) = RuleSet::builder("nav-only")
            .selector(".app-banner")
            .protections(Protections::SCHEMES)
            .build();
        let mut filter = CosmeticFilter::new(Arc::new(set));
        let mut stats = StatsSink::new();

        assert_eq!(filter.apply(&mut dom, &mut stats), 0);
        assert!(dom.is_attached(banner));
        assert_eq!(dom.style_injections, 0);
        assert!(dom.queries().is_empty());
    }

    #[test]
    fn empty_selector_list_touches_nothing() {
        let mut dom = FakeDom::new();
        let mut filter = filter(&[]);
        let mut stats = StatsSink::new();
        assert_eq!(filter.apply(&mut dom, &mut stats), 0);
        assert_eq!(dom.style_injections, 0);
    }

    #[test]
    fn sweep_scopes_queries_to_the_given_root() {
        let mut dom = FakeDom::new();
        let outside = dom.classed(0, "div", "app-banner");
        let subtree = dom.element(0, "section");
        let inside = dom.classed(subtree, "div", "app-banner");

        let filter = filter(&[".app-banner"]);
        let mut stats = StatsSink::new();
        let removed = filter.sweep(&mut dom, &subtree, &mut stats);

        assert_eq!(removed, 1);
        assert!(!dom.is_attached(inside));
        assert!(dom.is_attached(outside));
        assert_eq!(dom.queries(), vec![(subtree, ".app-banner".to_string())]);
    }
}

//! Shared test doubles: an in-memory DOM, a globals table, a manual clock
//! and recording presenters.

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::host::{AnchorInfo, DomError, DomHost, GlobalsHost, NavEvent};
use crate::stats::{Clock, Presenter, PresenterError};
use crate::types::{PatchOutcome, Severity};

// =============================================================================
// Fake DOM
// =============================================================================

#[derive(Debug, Clone)]
struct FakeNode {
    parent: Option<usize>,
    tag: String,
    class: Option<String>,
    id: Option<String>,
    href: Option<String>,
    text: String,
    attached: bool,
}

/// Index-addressed DOM tree. Node 0 is the document root.
///
/// Supports the selector shapes the engine's rule data uses: one class
/// (`.x`), one id (`#x`) or one tag name.
#[derive(Debug)]
pub(crate) struct FakeDom {
    nodes: Vec<FakeNode>,
    styles: Vec<(String, String)>,
    /// Total inject_style calls, replacements included
    pub style_injections: usize,
    query_log: RefCell<Vec<(usize, String)>>,
    reject_selectors: HashSet<String>,
    fail_detach: HashSet<usize>,
    fail_styles: bool,
}

impl FakeDom {
    pub fn new() -> Self {
        Self {
            nodes: vec![FakeNode {
                parent: None,
                tag: "body".to_string(),
                class: None,
                id: None,
                href: None,
                text: String::new(),
                attached: true,
            }],
            styles: Vec::new(),
            style_injections: 0,
            query_log: RefCell::new(Vec::new()),
            reject_selectors: HashSet::new(),
            fail_detach: HashSet::new(),
            fail_styles: false,
        }
    }

    fn push(&mut self, node: FakeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn element(&mut self, parent: usize, tag: &str) -> usize {
        self.push(FakeNode {
            parent: Some(parent),
            tag: tag.to_string(),
            class: None,
            id: None,
            href: None,
            text: String::new(),
            attached: true,
        })
    }

    pub fn classed(&mut self, parent: usize, tag: &str, class: &str) -> usize {
        let node = self.element(parent, tag);
        self.nodes[node].class = Some(class.to_string());
        node
    }

    pub fn anchor(&mut self, parent: usize, href: &str, text: &str) -> usize {
        let node = self.element(parent, "a");
        self.nodes[node].href = Some(href.to_string());
        self.nodes[node].text = text.to_string();
        node
    }

    pub fn set_id(&mut self, node: usize, id: &str) {
        self.nodes[node].id = Some(id.to_string());
    }

    /// Make queries for this selector fail.
    pub fn reject_selector(&mut self, selector: &str) {
        self.reject_selectors.insert(selector.to_string());
    }

    /// Make detach of this node fail.
    pub fn fail_detach(&mut self, node: usize) {
        self.fail_detach.insert(node);
    }

    pub fn fail_styles(&mut self) {
        self.fail_styles = true;
    }

    /// Attached, all ancestors included.
    pub fn is_attached(&self, node: usize) -> bool {
        let mut current = Some(node);
        while let Some(index) = current {
            if !self.nodes[index].attached {
                return false;
            }
            current = self.nodes[index].parent;
        }
        true
    }

    pub fn href(&self, node: usize) -> Option<&str> {
        self.nodes[node].href.as_deref()
    }

    pub fn styles(&self) -> &[(String, String)] {
        &self.styles
    }

    /// Every query so far as (root, selector), in call order.
    pub fn queries(&self) -> Vec<(usize, String)> {
        self.query_log.borrow().clone()
    }

    fn matches(&self, node: usize, selector: &str) -> bool {
        let n = &self.nodes[node];
        if let Some(class) = selector.strip_prefix('.') {
            n.class.as_deref() == Some(class)
        } else if let Some(id) = selector.strip_prefix('#') {
            n.id.as_deref() == Some(id)
        } else {
            n.tag == selector
        }
    }

    fn in_subtree(&self, node: usize, root: usize) -> bool {
        let mut current = Some(node);
        while let Some(index) = current {
            if index == root {
                return true;
            }
            current = self.nodes[index].parent;
        }
        false
    }
}

impl DomHost for FakeDom {
    type Node = usize;

    fn document_root(&self) -> usize {
        0
    }

    fn query(&self, root: &usize, selector: &str) -> Result<Vec<usize>, DomError> {
        self.query_log
            .borrow_mut()
            .push((*root, selector.to_string()));

        if self.reject_selectors.contains(selector) {
            return Err(DomError::Selector {
                selector: selector.to_string(),
                reason: "unsupported".to_string(),
            });
        }
        Ok((0..self.nodes.len())
            .filter(|&node| {
                self.is_attached(node)
                    && self.in_subtree(node, *root)
                    && self.matches(node, selector)
            })
            .collect())
    }

    fn detach(&mut self, node: &usize) -> Result<bool, DomError> {
        if self.fail_detach.contains(node) {
            return Err(DomError::Node(format!("Cannot detach node {node}")));
        }
        if !self.is_attached(*node) {
            return Ok(false);
        }
        self.nodes[*node].attached = false;
        Ok(true)
    }

    fn closest_anchor(&self, node: &usize) -> Option<AnchorInfo> {
        let mut current = Some(*node);
        while let Some(index) = current {
            let n = &self.nodes[index];
            if n.tag == "a" {
                return Some(AnchorInfo {
                    href: n.href.clone().unwrap_or_default(),
                    text: n.text.clone(),
                });
            }
            current = n.parent;
        }
        None
    }

    fn anchor_target(&self, node: &usize) -> Option<AnchorInfo> {
        let n = &self.nodes[*node];
        if n.tag == "a" {
            Some(AnchorInfo {
                href: n.href.clone().unwrap_or_default(),
                text: n.text.clone(),
            })
        } else {
            None
        }
    }

    fn disarm_link(&mut self, node: &usize) -> Result<bool, DomError> {
        let n = &mut self.nodes[*node];
        if n.href.as_deref() == Some("javascript:void(0)") {
            return Ok(false);
        }
        n.href = Some("javascript:void(0)".to_string());
        Ok(true)
    }

    fn inject_style(&mut self, id: &str, css: &str) -> Result<(), DomError> {
        if self.fail_styles {
            return Err(DomError::Style("Injection refused".to_string()));
        }
        self.style_injections += 1;
        if let Some(entry) = self.styles.iter_mut().find(|(sid, _)| sid == id) {
            entry.1 = css.to_string();
        } else {
            self.styles.push((id.to_string(), css.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Fake globals table
// =============================================================================

/// Page-global function table for patcher tests.
#[derive(Debug, Default)]
pub(crate) struct FakeGlobals {
    present: HashSet<String>,
    pub wrapped: HashSet<String>,
    foreign_wrapped: HashSet<String>,
    fail_names: HashSet<String>,
    pub script_hooked: bool,
}

impl FakeGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a global as present on the page.
    pub fn define(&mut self, name: &str) {
        self.present.insert(name.to_string());
    }

    /// Declare a global as present but already wrapped by someone else.
    pub fn define_foreign_wrapped(&mut self, name: &str) {
        self.present.insert(name.to_string());
        self.foreign_wrapped.insert(name.to_string());
    }

    /// Make wrapping this name fail outright.
    pub fn fail_wrap(&mut self, name: &str) {
        self.present.insert(name.to_string());
        self.fail_names.insert(name.to_string());
    }
}

impl GlobalsHost for FakeGlobals {
    fn wrap_callable(&mut self, name: &str) -> Result<PatchOutcome, DomError> {
        if self.fail_names.contains(name) {
            return Err(DomError::Patch(format!("Cannot wrap {name}")));
        }
        if !self.present.contains(name) {
            return Ok(PatchOutcome::Missing);
        }
        if self.foreign_wrapped.contains(name) || self.wrapped.contains(name) {
            return Ok(PatchOutcome::AlreadyWrapped);
        }
        self.wrapped.insert(name.to_string());
        Ok(PatchOutcome::Installed)
    }

    fn unwrap_callable(&mut self, name: &str) -> Result<(), DomError> {
        self.wrapped.remove(name);
        Ok(())
    }

    fn hook_script_creation(&mut self) -> Result<PatchOutcome, DomError> {
        if self.script_hooked {
            return Ok(PatchOutcome::AlreadyWrapped);
        }
        self.script_hooked = true;
        Ok(PatchOutcome::Installed)
    }

    fn unhook_script_creation(&mut self) -> Result<(), DomError> {
        self.script_hooked = false;
        Ok(())
    }
}

// =============================================================================
// Fake event
// =============================================================================

#[derive(Debug, Default)]
pub(crate) struct FakeEvent {
    pub prevented: bool,
    pub stopped: bool,
}

impl FakeEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// An event some earlier handler already cancelled.
    pub fn already_cancelled() -> Self {
        Self {
            prevented: true,
            stopped: false,
        }
    }
}

impl NavEvent for FakeEvent {
    fn prevent_default(&mut self) {
        self.prevented = true;
    }

    fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    fn cancelled(&self) -> bool {
        self.prevented
    }
}

// =============================================================================
// Clock and presenters
// =============================================================================

/// Clock advanced by hand.
#[derive(Debug)]
pub(crate) struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(ms)))
    }

    pub fn handle(&self) -> ManualClockHandle {
        ManualClockHandle(self.0.clone())
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ManualClockHandle(Arc<AtomicU64>);

impl ManualClockHandle {
    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::Relaxed);
    }
}

/// Presenter that records what it was asked to show.
#[derive(Debug, Default)]
pub(crate) struct RecordingPresenter {
    messages: Arc<Mutex<Vec<(String, Severity)>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Arc<Mutex<Vec<(String, Severity)>>> {
        self.messages.clone()
    }
}

impl Presenter for RecordingPresenter {
    fn notify(&mut self, message: &str, severity: Severity) -> Result<(), PresenterError> {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
        Ok(())
    }
}

/// Presenter whose delivery always fails.
#[derive(Debug)]
pub(crate) struct FailingPresenter;

impl Presenter for FailingPresenter {
    fn notify(&mut self, _message: &str, _severity: Severity) -> Result<(), PresenterError> {
        Err(PresenterError("Toast channel closed".to_string()))
    }
}

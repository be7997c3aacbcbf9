//! Host-facing traits
//!
//! The engine never touches a real DOM. Hosts (the wasm bindings in a
//! browser, fakes in tests) implement these traits and the engine drives
//! them. Node handles are opaque: the engine only ever passes them back to
//! the same host.

use crate::types::PatchOutcome;

/// Error type for host-side DOM operations.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// The host rejected a selector at query time
    #[error("Selector rejected: {selector}: {reason}")]
    Selector { selector: String, reason: String },
    /// A node operation failed (stale handle, detached context)
    #[error("Node operation failed: {0}")]
    Node(String),
    /// Stylesheet injection failed
    #[error("Style injection failed: {0}")]
    Style(String),
    /// Installing or removing a wrapper failed
    #[error("Patch operation failed: {0}")]
    Patch(String),
}

/// Target information for an anchor element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorInfo {
    /// The anchor's href as the host resolves it
    pub href: String,
    /// Visible link text
    pub text: String,
}

/// DOM access surface.
///
/// `query` returns `root` itself when it matches the selector, plus all
/// matching descendants; hosts backed by `querySelectorAll` add the
/// `matches()` check on the root. `detach` reports whether the node was
/// still attached, which is what keeps repeated sweeps from double counting.
pub trait DomHost {
    type Node: Clone;

    /// Handle for the document root.
    fn document_root(&self) -> Self::Node;

    /// All nodes under `root` (inclusive) matching `selector`.
    fn query(&self, root: &Self::Node, selector: &str) -> Result<Vec<Self::Node>, DomError>;

    /// Remove a node from the tree. Returns true if it was attached.
    fn detach(&mut self, node: &Self::Node) -> Result<bool, DomError>;

    /// The nearest enclosing anchor of `node` (including itself), if any.
    fn closest_anchor(&self, node: &Self::Node) -> Option<AnchorInfo>;

    /// Target info if `node` is itself an anchor.
    fn anchor_target(&self, node: &Self::Node) -> Option<AnchorInfo>;

    /// Rewrite an anchor's href to an inert value, leaving the element in
    /// place. Returns true if the href actually changed.
    fn disarm_link(&mut self, node: &Self::Node) -> Result<bool, DomError>;

    /// Install or replace the stylesheet registered under `id`.
    fn inject_style(&mut self, id: &str, css: &str) -> Result<(), DomError>;
}

/// Access to the page's global scope for the function patcher.
pub trait GlobalsHost {
    /// Replace the named global callable with a reporting stub.
    fn wrap_callable(&mut self, name: &str) -> Result<PatchOutcome, DomError>;

    /// Restore a callable wrapped earlier by this host.
    fn unwrap_callable(&mut self, name: &str) -> Result<(), DomError>;

    /// Arm the script-element creation path so source and URL assignments
    /// are screened before execution.
    fn hook_script_creation(&mut self) -> Result<PatchOutcome, DomError>;

    /// Disarm the script-element creation hook.
    fn unhook_script_creation(&mut self) -> Result<(), DomError>;
}

/// A cancellable host event (click, submit).
pub trait NavEvent {
    fn prevent_default(&mut self);
    fn stop_propagation(&mut self);
    /// True once the default action has been cancelled, by anyone.
    fn cancelled(&self) -> bool;
}

//! Core type definitions for PageWarden
//!
//! These types cross every module boundary: compiled rule data references
//! them, and the host bindings marshal them outward with every block
//! decision.

// =============================================================================
// Block Categories
// =============================================================================

/// Category of a block decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockCategory {
    /// A navigation target (app scheme or keyword match) was suppressed
    Scheme = 0,
    /// A DOM element was removed by the cosmetic filter
    Element = 1,
    /// A script was neutralized (stubbed global or screened source)
    Script = 2,
}

impl BlockCategory {
    /// Stable lowercase name, used in logs and host-facing payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheme => "scheme",
            Self::Element => "element",
            Self::Script => "script",
        }
    }
}

impl TryFrom<u8> for BlockCategory {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Scheme),
            1 => Ok(Self::Element),
            2 => Ok(Self::Script),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Block Events
// =============================================================================

/// One recorded block decision.
///
/// Events are append-only for the lifetime of a page session; the sink clears
/// them on teardown only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEvent {
    /// What kind of thing was blocked
    pub category: BlockCategory,
    /// The blocked URL, selector, function name, or source excerpt
    pub detail: String,
    /// Milliseconds since the Unix epoch, from the host clock
    pub at_ms: u64,
}

// =============================================================================
// Notification Severity
// =============================================================================

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

// =============================================================================
// Navigation Surfaces
// =============================================================================

/// Which host surface a navigation attempt came in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavSurface {
    /// Capture-phase click on or inside an anchor
    AnchorClick,
    /// A `window.open` call
    WindowOpen,
    /// Assignment to the current location
    LocationAssign,
    /// A form submission
    FormSubmit,
}

impl NavSurface {
    /// Parse from the host-facing surface name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "click" => Some(Self::AnchorClick),
            "open" => Some(Self::WindowOpen),
            "location" => Some(Self::LocationAssign),
            "submit" => Some(Self::FormSubmit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnchorClick => "click",
            Self::WindowOpen => "open",
            Self::LocationAssign => "location",
            Self::FormSubmit => "submit",
        }
    }
}

// =============================================================================
// Verdicts
// =============================================================================

/// Disposition for a screened navigation.
///
/// Call-style surfaces (`window.open`, location assignment) act on this
/// directly: the host returns null / discards the assignment on `Suppress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDisposition {
    /// Let the navigation proceed unchanged
    Proceed,
    /// Cancel the navigation; the decision is final
    Suppress,
}

/// Verdict for screened script source or script URL assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptVerdict {
    /// The assignment goes through unchanged
    Proceed,
    /// The assignment is dropped before it can execute
    Discard,
}

/// Host-reported outcome of installing one wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The wrapper is now in place
    Installed,
    /// Something (this engine or another) already wrapped the target
    AlreadyWrapped,
    /// The global does not exist on this page; nothing to do
    Missing,
}

// =============================================================================
// Protection Flags
// =============================================================================

bitflags::bitflags! {
    /// Which engine features a RuleSet arms.
    pub struct Protections: u8 {
        /// Cosmetic filtering (hide stylesheet + element removal)
        const ELEMENTS = 1 << 0;
        /// Navigation screening (schemes and keyword patterns)
        const SCHEMES = 1 << 1;
        /// Global-function stubbing and script screening
        const FUNCTIONS = 1 << 2;
        /// Mutation watching (incremental sweeps, dynamic link disarming)
        const DYNAMIC = 1 << 3;

        /// Everything on; the default for rule sets that don't say otherwise
        const ALL = Self::ELEMENTS.bits()
            | Self::SCHEMES.bits()
            | Self::FUNCTIONS.bits()
            | Self::DYNAMIC.bits();
    }
}

impl Protections {
    /// Parse one protection name as it appears in rule files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "elements" => Some(Self::ELEMENTS),
            "schemes" => Some(Self::SCHEMES),
            "functions" => Some(Self::FUNCTIONS),
            "dynamic" => Some(Self::DYNAMIC),
            "all" => Some(Self::ALL),
            _ => None,
        }
    }
}

//! Block counters, the event log, and user-facing notifications
//!
//! Every component reports through one [`StatsSink`]. The sink owns the
//! per-category counters and the ordered event log. Events are stamped
//! through a [`Clock`] and optional toasts go out through a [`Presenter`].
//! Presenter failures are swallowed: notification is observability, not
//! control flow.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{BlockCategory, BlockEvent, Severity};

// =============================================================================
// Clock
// =============================================================================

/// Source of millisecond timestamps for block events.
///
/// Hosts without a usable system clock (wasm) supply their own.
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

// =============================================================================
// Presenter
// =============================================================================

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
#[error("Notification failed: {0}")]
pub struct PresenterError(pub String);

/// Delivers user-facing messages (toasts, console banners).
///
/// Implementations render however they like; the engine never waits on them
/// and never reacts to their errors.
pub trait Presenter: Send {
    fn notify(&mut self, message: &str, severity: Severity) -> Result<(), PresenterError>;
}

// =============================================================================
// Snapshot
// =============================================================================

/// Point-in-time copy of the counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub schemes: u64,
    pub elements: u64,
    pub scripts: u64,
    pub total: u64,
}

// =============================================================================
// StatsSink
// =============================================================================

/// Accumulates block events and forwards notifications.
pub struct StatsSink {
    schemes: u64,
    elements: u64,
    scripts: u64,
    events: Vec<BlockEvent>,
    clock: Box<dyn Clock>,
    presenter: Option<Box<dyn Presenter>>,
    notify_blocks: bool,
}

impl std::fmt::Debug for StatsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsSink")
            .field("schemes", &self.schemes)
            .field("elements", &self.elements)
            .field("scripts", &self.scripts)
            .field("events", &self.events.len())
            .field("notify_blocks", &self.notify_blocks)
            .finish()
    }
}

impl Default for StatsSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSink {
    /// Sink with the system clock, no presenter, block toasts off.
    pub fn new() -> Self {
        Self {
            schemes: 0,
            elements: 0,
            scripts: 0,
            events: Vec::new(),
            clock: Box::new(SystemClock),
            presenter: None,
            notify_blocks: false,
        }
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    pub fn set_presenter(&mut self, presenter: Option<Box<dyn Presenter>>) {
        self.presenter = presenter;
    }

    /// Toggle a toast per recorded block. Off by default.
    pub fn set_notify_blocks(&mut self, enabled: bool) {
        self.notify_blocks = enabled;
    }

    /// Count one block and append it to the event log.
    pub fn record(&mut self, category: BlockCategory, detail: impl Into<String>) {
        let detail = detail.into();
        match category {
            BlockCategory::Scheme => self.schemes += 1,
            BlockCategory::Element => self.elements += 1,
            BlockCategory::Script => self.scripts += 1,
        }
        if self.notify_blocks {
            let message = format!("Blocked {}: {}", category.as_str(), detail);
            self.notify(&message, Severity::Warning);
        }
        self.events.push(BlockEvent {
            category,
            detail,
            at_ms: self.clock.now_ms(),
        });
    }

    /// Forward a message to the presenter, if any. Delivery errors are
    /// logged and dropped.
    pub fn notify(&mut self, message: &str, severity: Severity) {
        if let Some(presenter) = self.presenter.as_mut() {
            if let Err(err) = presenter.notify(message, severity) {
                log::debug!("Presenter error: {err}");
            }
        }
    }

    /// Current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            schemes: self.schemes,
            elements: self.elements,
            scripts: self.scripts,
            total: self.schemes + self.elements + self.scripts,
        }
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> &[BlockEvent] {
        &self.events
    }

    /// Zero the counters and drop the event log.
    pub fn clear(&mut self) {
        self.schemes = 0;
        self.elements = 0;
        self.scripts = 0;
        self.events.clear();
    }
}

//! The fake `Event`.
//!
//! Mirrors the DOM `Event` interface closely enough for code written against
//! the real API: read-only flags, phase, and the three propagation-control
//! operations. Flags live in [`Cell`]s so listeners can flip them through a
//! shared reference while the event is being dispatched.

// ============================================================================
// Imports
// ============================================================================

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::source::EventSource;

use super::message::MessageEvent;

// ============================================================================
// EventPhase
// ============================================================================

/// Which phase of the event flow is being evaluated.
///
/// Without a DOM tree only [`EventPhase::None`] and [`EventPhase::AtTarget`]
/// are ever observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventPhase {
    /// The event is not being processed.
    #[default]
    None = 0,
    /// Capturing phase.
    Capturing = 1,
    /// The event has reached its target.
    AtTarget = 2,
    /// Bubbling phase.
    Bubbling = 3,
}

impl EventPhase {
    /// Returns the numeric constant used by the DOM.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// EventInit
// ============================================================================

/// Optional flags for [`Event::with_init`].
///
/// Every lifecycle event the fake produces uses the default (all `false`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInit {
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether `prevent_default` has an effect.
    pub cancelable: bool,
    /// Whether the event crosses shadow DOM boundaries.
    pub composed: bool,
}

impl EventInit {
    /// Creates the default init dictionary.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bubbles: false,
            cancelable: false,
            composed: false,
        }
    }

    /// Marks the event as bubbling.
    #[inline]
    #[must_use]
    pub fn with_bubbles(mut self) -> Self {
        self.bubbles = true;
        self
    }

    /// Marks the event as cancelable.
    #[inline]
    #[must_use]
    pub fn with_cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    /// Marks the event as composed.
    #[inline]
    #[must_use]
    pub fn with_composed(mut self) -> Self {
        self.composed = true;
        self
    }
}

// ============================================================================
// Event
// ============================================================================

/// One dispatched occurrence on a fake `EventSource`.
///
/// `target`, `current_target` and `src_element` all return the connection the
/// event was created for.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    target: EventSource,
    init: EventInit,
    time_stamp: u64,
    phase: Cell<EventPhase>,
    default_prevented: Cell<bool>,
    cancel_bubble: Cell<bool>,
    /// Set by `stop_immediate_propagation`; checked before every listener.
    stopped: Cell<bool>,
    message: Option<MessageEvent>,
}

// ============================================================================
// Event - Constructors
// ============================================================================

impl Event {
    /// Creates a non-cancelable, non-bubbling event.
    #[must_use]
    pub fn new(event_type: impl Into<String>, target: &EventSource) -> Self {
        Self::with_init(event_type, target, EventInit::new())
    }

    /// Creates an event with explicit flags.
    #[must_use]
    pub fn with_init(event_type: impl Into<String>, target: &EventSource, init: EventInit) -> Self {
        Self::build(event_type.into(), target, init, None)
    }

    pub(crate) fn build(
        event_type: String,
        target: &EventSource,
        init: EventInit,
        message: Option<MessageEvent>,
    ) -> Self {
        Self {
            event_type,
            target: target.clone(),
            init,
            time_stamp: now_millis(),
            phase: Cell::new(EventPhase::None),
            default_prevented: Cell::new(false),
            cancel_bubble: Cell::new(false),
            stopped: Cell::new(false),
            message,
        }
    }
}

// ============================================================================
// Event - Accessors
// ============================================================================

impl Event {
    /// The event type (e.g. `open`, `message`, `error`).
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The connection the event was dispatched to.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &EventSource {
        &self.target
    }

    /// The connection whose listeners are running.
    #[inline]
    #[must_use]
    pub fn current_target(&self) -> &EventSource {
        &self.target
    }

    /// Legacy alias of [`Event::target`].
    #[inline]
    #[must_use]
    pub fn src_element(&self) -> &EventSource {
        &self.target
    }

    /// The current phase.
    #[inline]
    #[must_use]
    pub fn event_phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Whether the event bubbles.
    #[inline]
    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.init.bubbles
    }

    /// Whether `prevent_default` has an effect.
    #[inline]
    #[must_use]
    pub fn cancelable(&self) -> bool {
        self.init.cancelable
    }

    /// Whether the event crosses shadow DOM boundaries.
    #[inline]
    #[must_use]
    pub fn composed(&self) -> bool {
        self.init.composed
    }

    /// Whether `prevent_default` took effect.
    #[inline]
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Legacy inverse of [`Event::default_prevented`].
    #[inline]
    #[must_use]
    pub fn return_value(&self) -> bool {
        !self.default_prevented.get()
    }

    /// Whether propagation was stopped.
    #[inline]
    #[must_use]
    pub fn cancel_bubble(&self) -> bool {
        self.cancel_bubble.get()
    }

    /// Fake events always report themselves as trusted.
    #[inline]
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        true
    }

    /// Creation time in milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub fn time_stamp(&self) -> u64 {
        self.time_stamp
    }

    /// Returns the message payload when this is a message event.
    #[inline]
    #[must_use]
    pub fn as_message(&self) -> Option<&MessageEvent> {
        self.message.as_ref()
    }

    /// Shortcut for the message data.
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.message.as_ref().map(MessageEvent::data)
    }
}

// ============================================================================
// Event - Propagation
// ============================================================================

impl Event {
    /// Kept for API parity; events are initialized at construction.
    #[inline]
    pub fn init_event(&self) {}

    /// Cancels the event if it is cancelable.
    pub fn prevent_default(&self) {
        if self.init.cancelable {
            self.default_prevented.set(true);
        }
    }

    /// Stops propagation beyond the current target.
    ///
    /// Only the `cancel_bubble` flag is affected.
    pub fn stop_propagation(&self) {
        self.cancel_bubble.set(true);
    }

    /// Prevents every remaining listener from running.
    pub fn stop_immediate_propagation(&self) {
        self.cancel_bubble.set(true);
        self.stopped.set(true);
    }

    /// Setting `true` acts like [`Event::stop_propagation`]; `false` is ignored.
    pub fn set_cancel_bubble(&self, value: bool) {
        if value {
            self.stop_propagation();
        }
    }

    #[inline]
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    #[inline]
    pub(crate) fn set_phase(&self, phase: EventPhase) {
        self.phase.set(phase);
    }
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

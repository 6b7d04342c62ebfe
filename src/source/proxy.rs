//! Test-side control surface of a connection.
//!
//! An [`EventSourceProxy`] forwards the standard `EventSource` surface and
//! adds the operations a test uses to play the server: emitting messages,
//! failing or reestablishing the connection, and inspecting listeners.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use fake_eventsource::{Event, Listener, ReadyState, SseMock};
//!
//! let mock = SseMock::builder().build().unwrap();
//! mock.with_mock(|connections| {
//!     let binding = mock.binding();
//!     let source = binding.construct("/stream", Default::default()).unwrap();
//!
//!     let received = Arc::new(AtomicUsize::new(0));
//!     let counter = Arc::clone(&received);
//!     source.add_event_listener("message", Listener::new(move |_: &Event| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }));
//!
//!     let proxy = connections.most_recent().unwrap();
//!     proxy.emit("hello").unwrap();
//!
//!     assert_eq!(source.ready_state(), ReadyState::Open);
//!     assert_eq!(received.load(Ordering::SeqCst), 1);
//! })
//! .unwrap();
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::event::{Event, MessageDescriptor};
use crate::identifiers::ConnectionId;

use super::connection::EventSource;
use super::listener::Listener;
use super::state::ReadyState;

// ============================================================================
// EventSourceProxy
// ============================================================================

/// Wraps one [`EventSource`] for test control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSourceProxy {
    source: EventSource,
}

impl EventSourceProxy {
    /// `readyState` while connecting.
    pub const CONNECTING: ReadyState = ReadyState::Connecting;
    /// `readyState` while open.
    pub const OPEN: ReadyState = ReadyState::Open;
    /// `readyState` once closed.
    pub const CLOSED: ReadyState = ReadyState::Closed;

    /// Wraps `source`.
    #[inline]
    #[must_use]
    pub fn new(source: EventSource) -> Self {
        Self { source }
    }

    /// Returns the wrapped connection.
    #[inline]
    #[must_use]
    pub fn event_source(&self) -> &EventSource {
        &self.source
    }
}

// ============================================================================
// EventSourceProxy - Forwarded Surface
// ============================================================================

impl EventSourceProxy {
    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.source.id()
    }

    /// Returns the serialized URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        self.source.url()
    }

    /// Returns the current readiness state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.source.ready_state()
    }

    /// Returns `true` if the connection was created with credentials.
    #[inline]
    #[must_use]
    pub fn with_credentials(&self) -> bool {
        self.source.with_credentials()
    }

    /// The `onopen` handler.
    #[inline]
    #[must_use]
    pub fn onopen(&self) -> Option<Listener> {
        self.source.onopen()
    }

    /// Sets the `onopen` handler.
    #[inline]
    pub fn set_onopen(&self, handler: Option<Listener>) {
        self.source.set_onopen(handler);
    }

    /// The `onmessage` handler.
    #[inline]
    #[must_use]
    pub fn onmessage(&self) -> Option<Listener> {
        self.source.onmessage()
    }

    /// Sets the `onmessage` handler.
    #[inline]
    pub fn set_onmessage(&self, handler: Option<Listener>) {
        self.source.set_onmessage(handler);
    }

    /// The `onerror` handler.
    #[inline]
    #[must_use]
    pub fn onerror(&self) -> Option<Listener> {
        self.source.onerror()
    }

    /// Sets the `onerror` handler.
    #[inline]
    pub fn set_onerror(&self, handler: Option<Listener>) {
        self.source.set_onerror(handler);
    }

    /// Registers `listener` for `event_type` on the wrapped connection.
    #[inline]
    pub fn add_event_listener(&self, event_type: &str, listener: Listener) {
        self.source.add_event_listener(event_type, listener);
    }

    /// Unregisters `listener` for `event_type` on the wrapped connection.
    #[inline]
    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) {
        self.source.remove_event_listener(event_type, listener);
    }

    /// Dispatches `event` on the wrapped connection.
    #[inline]
    pub fn dispatch_event(&self, event: &Event) -> bool {
        self.source.dispatch_event(event)
    }

    /// Closes the wrapped connection without dispatching anything.
    #[inline]
    pub fn close(&self) {
        self.source.close();
    }
}

// ============================================================================
// EventSourceProxy - Test Controls
// ============================================================================

impl EventSourceProxy {
    /// Emits a message as if the server had pushed it.
    ///
    /// Objects are read as `{ "type", "id", "data" }` descriptors; any other
    /// value is delivered as the string data of a `message` event. The first
    /// emit on a connecting connection opens it (dispatching `open`) before
    /// the message is dispatched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMessage`] if `data` is `null`
    /// - [`Error::EmitOnClosed`] if the connection is closed
    /// - [`Error::Json`] if an object has a non-string `type`
    pub fn emit(&self, data: impl Into<Value>) -> Result<()> {
        let data = data.into();

        if data.is_null() {
            return Err(Error::invalid_message("null"));
        }

        if self.ready_state().is_closed() {
            return Err(Error::EmitOnClosed);
        }

        let descriptor = MessageDescriptor::from_payload(data)?;
        self.deliver(descriptor);
        Ok(())
    }

    /// Emits a typed message descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmitOnClosed`] if the connection is closed.
    pub fn emit_message(&self, descriptor: MessageDescriptor) -> Result<()> {
        if self.ready_state().is_closed() {
            return Err(Error::EmitOnClosed);
        }

        self.deliver(descriptor);
        Ok(())
    }

    /// Fails the connection: closes it and dispatches `error`.
    ///
    /// No-op on a closed connection.
    pub fn fail_connection(&self) {
        if self.ready_state().is_closed() {
            warn!(connection = %self.id(), "failConnection ignored: connection is closed");
            return;
        }

        self.source.fail_connection();
    }

    /// Reestablishes the connection: back to connecting, dispatching `error`.
    ///
    /// No-op on a closed connection.
    pub fn reestablish_connection(&self) {
        if self.ready_state().is_closed() {
            warn!(connection = %self.id(), "reestablishConnection ignored: connection is closed");
            return;
        }

        self.source.reestablish_connection();
    }

    /// Returns a snapshot of the listeners registered for `event_type`, or of
    /// every listener (grouped by type, in registration order) when `None`.
    #[must_use]
    pub fn get_event_listeners(&self, event_type: Option<&str>) -> Vec<Listener> {
        self.source.listeners(event_type)
    }

    /// Opens the connection if needed and dispatches the message.
    fn deliver(&self, descriptor: MessageDescriptor) {
        if self.ready_state() == ReadyState::Connecting {
            self.source.announce_connection();
        }

        debug!(connection = %self.id(), event_type = %descriptor.event_type, "Emitting message");

        let event = Event::message(descriptor, &self.source);
        self.source.dispatch_event(&event);
    }
}

// ============================================================================
// Tests
// ============================================================================

//! The fake `EventSource` connection and its dispatch algorithm.
//!
//! An [`EventSource`] is a cheap, clonable handle; clones share the same
//! connection and compare equal. Connections are created through
//! [`FakeEventSourceFactory`](crate::FakeEventSourceFactory), which also
//! records them in the registry.
//!
//! # Dispatch
//!
//! [`EventSource::dispatch_event`] runs synchronously:
//!
//! 1. the event enters the `AtTarget` phase
//! 2. the `on<type>` handler slot runs, if set
//! 3. listeners registered when dispatch began run in insertion order until
//!    one calls `stop_immediate_propagation`; listeners removed meanwhile are
//!    skipped
//! 4. the event returns to phase `None`
//!
//! Listener errors and panics are logged and never abort the dispatch.
//! No lock is held while user code runs, so listeners may freely call back
//! into the connection.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, trace};

use crate::event::{Event, EventPhase};
use crate::identifiers::ConnectionId;
use crate::resolver::UrlRecord;

use super::listener::{HandlerSlot, HandlerSlots, Listener, ListenerRegistry};
use super::state::{CorsMode, ReadyState};

// ============================================================================
// EventSourceInit
// ============================================================================

/// Options accepted by the `EventSource` constructor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSourceInit {
    /// Send credentials with cross-origin requests.
    pub with_credentials: bool,
}

impl EventSourceInit {
    /// Creates the default options (no credentials).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            with_credentials: false,
        }
    }

    /// Enables credentials.
    #[inline]
    #[must_use]
    pub fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }
}

// ============================================================================
// EventSourceInner
// ============================================================================

/// Shared state behind every clone of an [`EventSource`].
struct EventSourceInner {
    id: ConnectionId,
    url: UrlRecord,
    /// Serialized `url`, computed once.
    href: String,
    cors_mode: CorsMode,
    state: RwLock<ReadyState>,
    listeners: Mutex<ListenerRegistry>,
    handlers: Mutex<HandlerSlots>,
}

// ============================================================================
// EventSource
// ============================================================================

/// A fake Server-Sent-Events connection.
///
/// Starts in [`ReadyState::Connecting`]. Tests move it through its lifecycle
/// with an [`EventSourceProxy`](crate::EventSourceProxy); application code
/// only sees the standard surface exposed here.
#[derive(Clone)]
pub struct EventSource {
    inner: Arc<EventSourceInner>,
}

impl PartialEq for EventSource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for EventSource {}

impl fmt::Debug for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("id", &self.inner.id)
            .field("url", &self.inner.href)
            .field("ready_state", &self.ready_state())
            .field("with_credentials", &self.with_credentials())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EventSource - Constructor
// ============================================================================

impl EventSource {
    /// `readyState` while connecting.
    pub const CONNECTING: ReadyState = ReadyState::Connecting;
    /// `readyState` while open.
    pub const OPEN: ReadyState = ReadyState::Open;
    /// `readyState` once closed.
    pub const CLOSED: ReadyState = ReadyState::Closed;

    /// Creates an untracked connection for a resolved URL.
    pub(crate) fn new(url: UrlRecord, init: EventSourceInit) -> Self {
        let cors_mode = if init.with_credentials {
            CorsMode::UseCredentials
        } else {
            CorsMode::Anonymous
        };

        let href = url.to_string();
        let id = ConnectionId::generate();

        debug!(connection = %id, url = %href, cors_mode = cors_mode.as_str(), "EventSource created");

        Self {
            inner: Arc::new(EventSourceInner {
                id,
                url,
                href,
                cors_mode,
                state: RwLock::new(ReadyState::Connecting),
                listeners: Mutex::new(ListenerRegistry::default()),
                handlers: Mutex::new(HandlerSlots::default()),
            }),
        }
    }
}

// ============================================================================
// EventSource - Accessors
// ============================================================================

impl EventSource {
    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Returns the serialized URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.href
    }

    /// Returns the resolved URL components.
    #[inline]
    #[must_use]
    pub fn url_record(&self) -> &UrlRecord {
        &self.inner.url
    }

    /// Returns the current readiness state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        *self.inner.state.read()
    }

    /// Returns `true` if the connection was created with credentials.
    #[inline]
    #[must_use]
    pub fn with_credentials(&self) -> bool {
        self.inner.cors_mode == CorsMode::UseCredentials
    }

    /// Returns the CORS attribute state.
    #[inline]
    #[must_use]
    pub fn cors_mode(&self) -> CorsMode {
        self.inner.cors_mode
    }
}

// ============================================================================
// EventSource - Handler Slots
// ============================================================================

impl EventSource {
    /// Returns the handler stored in `slot`.
    #[must_use]
    pub fn handler(&self, slot: HandlerSlot) -> Option<Listener> {
        self.inner.handlers.lock().get(slot)
    }

    /// Replaces the handler stored in `slot`.
    pub fn set_handler(&self, slot: HandlerSlot, handler: Option<Listener>) {
        trace!(connection = %self.inner.id, slot = slot.event_type(), set = handler.is_some(), "Handler slot updated");
        self.inner.handlers.lock().set(slot, handler);
    }

    /// The `onopen` handler.
    #[inline]
    #[must_use]
    pub fn onopen(&self) -> Option<Listener> {
        self.handler(HandlerSlot::Open)
    }

    /// Sets the `onopen` handler.
    #[inline]
    pub fn set_onopen(&self, handler: Option<Listener>) {
        self.set_handler(HandlerSlot::Open, handler);
    }

    /// The `onmessage` handler.
    #[inline]
    #[must_use]
    pub fn onmessage(&self) -> Option<Listener> {
        self.handler(HandlerSlot::Message)
    }

    /// Sets the `onmessage` handler.
    #[inline]
    pub fn set_onmessage(&self, handler: Option<Listener>) {
        self.set_handler(HandlerSlot::Message, handler);
    }

    /// The `onerror` handler.
    #[inline]
    #[must_use]
    pub fn onerror(&self) -> Option<Listener> {
        self.handler(HandlerSlot::Error)
    }

    /// Sets the `onerror` handler.
    #[inline]
    pub fn set_onerror(&self, handler: Option<Listener>) {
        self.set_handler(HandlerSlot::Error, handler);
    }
}

// ============================================================================
// EventSource - EventTarget
// ============================================================================

impl EventSource {
    /// Registers `listener` for `event_type`.
    ///
    /// Registering the same listener twice for a type is a no-op.
    pub fn add_event_listener(&self, event_type: &str, listener: Listener) {
        let added = self.inner.listeners.lock().add(event_type, listener);
        trace!(connection = %self.inner.id, event_type, added, "addEventListener");
    }

    /// Unregisters `listener` for `event_type`. Unknown listeners are ignored.
    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) {
        let removed = self.inner.listeners.lock().remove(event_type, listener);
        trace!(connection = %self.inner.id, event_type, removed, "removeEventListener");
    }

    /// Dispatches `event` to the handler slot and listeners for its type.
    ///
    /// Returns `true` only if the event is cancelable and a listener called
    /// `prevent_default`.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let event_type = event.event_type();
        let listeners = self.inner.listeners.lock().for_type(event_type);
        let handler = HandlerSlot::for_event_type(event_type).and_then(|slot| self.handler(slot));

        trace!(
            connection = %self.inner.id,
            event_type,
            listeners = listeners.len(),
            has_handler = handler.is_some(),
            "Dispatching event"
        );

        event.set_phase(EventPhase::AtTarget);

        if let Some(handler) = &handler {
            self.invoke(handler, event);
        }

        for listener in &listeners {
            if event.is_stopped() {
                break;
            }
            if !self.inner.listeners.lock().contains(event_type, listener) {
                continue;
            }
            self.invoke(listener, event);
        }

        event.set_phase(EventPhase::None);

        event.cancelable() && event.default_prevented()
    }

    /// Closes the connection without dispatching anything.
    pub fn close(&self) {
        self.transition(ReadyState::Closed);
    }
}

// ============================================================================
// EventSource - Lifecycle (driven by the proxy)
// ============================================================================

impl EventSource {
    /// `Connecting -> Open`, dispatching `open`.
    pub(crate) fn announce_connection(&self) {
        self.transition(ReadyState::Open);
        self.dispatch_event(&Event::new("open", self));
    }

    /// Any state -> `Closed`, dispatching `error`.
    pub(crate) fn fail_connection(&self) {
        self.transition(ReadyState::Closed);
        self.dispatch_event(&Event::new("error", self));
    }

    /// Any state -> `Connecting`, dispatching `error`.
    pub(crate) fn reestablish_connection(&self) {
        self.transition(ReadyState::Connecting);
        self.dispatch_event(&Event::new("error", self));
    }

    /// Snapshot of listeners for one type, or all of them.
    pub(crate) fn listeners(&self, event_type: Option<&str>) -> Vec<Listener> {
        let registry = self.inner.listeners.lock();
        match event_type {
            Some(event_type) => registry.for_type(event_type),
            None => registry.all(),
        }
    }

    fn transition(&self, to: ReadyState) {
        let from = std::mem::replace(&mut *self.inner.state.write(), to);
        debug!(connection = %self.inner.id, %from, %to, "readyState changed");
    }

    /// Runs one listener, logging instead of propagating failures.
    fn invoke(&self, listener: &Listener, event: &Event) {
        match panic::catch_unwind(AssertUnwindSafe(|| listener.call(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(
                    connection = %self.inner.id,
                    event_type = event.event_type(),
                    error = %e,
                    "Listener failed"
                );
            }
            Err(payload) => {
                error!(
                    connection = %self.inner.id,
                    event_type = event.event_type(),
                    panic = %panic_message(payload.as_ref()),
                    "Listener panicked"
                );
            }
        }
    }
}

/// Extracts the message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use crate::event::EventInit;
    use crate::resolver::UrlResolver;
    use crate::source::HandleEvent;
    use crate::source::listener::ListenerResult;

    /// Shared call log.
    type Log = Arc<Mutex<Vec<String>>>;

    fn connection() -> EventSource {
        let url = UrlResolver::default().resolve("/stream").expect("resolve");
        EventSource::new(url, EventSourceInit::default())
    }

    fn recorder(log: &Log, name: &'static str) -> Listener {
        let log = Arc::clone(log);
        Listener::new(move |event: &Event| {
            log.lock().push(format!("{name}:{}", event.event_type()));
        })
    }

    #[test]
    fn test_initial_state() {
        let source = connection();

        assert_eq!(source.ready_state(), EventSource::CONNECTING);
        assert_eq!(source.url(), "http://localhost:9876/stream");
        assert!(!source.with_credentials());
        assert_eq!(source.cors_mode(), CorsMode::Anonymous);
        assert!(source.onopen().is_none());
        assert!(source.onmessage().is_none());
        assert!(source.onerror().is_none());
    }

    #[test]
    fn test_with_credentials() {
        let url = UrlResolver::default().resolve("/stream").expect("resolve");
        let source = EventSource::new(url, EventSourceInit::new().with_credentials());

        assert!(source.with_credentials());
        assert_eq!(source.cors_mode(), CorsMode::UseCredentials);
    }

    #[test]
    fn test_clones_are_equal() {
        let a = connection();
        let b = connection();

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_listener_invoked_once() {
        let source = connection();
        let log = Log::default();
        let listener = recorder(&log, "l");

        source.add_event_listener("open", listener.clone());
        source.add_event_listener("open", listener);
        source.dispatch_event(&Event::new("open", &source));

        assert_eq!(*log.lock(), vec!["l:open"]);
    }

    #[test]
    fn test_removed_listener_not_invoked() {
        let source = connection();
        let log = Log::default();
        let listener = recorder(&log, "l");

        source.add_event_listener("message", listener.clone());
        source.remove_event_listener("message", &listener);
        source.remove_event_listener("unknown", &listener);
        source.dispatch_event(&Event::new("message", &source));

        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_only_matching_type_invoked() {
        let source = connection();
        let log = Log::default();

        source.add_event_listener("open", recorder(&log, "open"));
        source.add_event_listener("error", recorder(&log, "error"));
        source.dispatch_event(&Event::new("error", &source));

        assert_eq!(*log.lock(), vec!["error:error"]);
    }

    #[test]
    fn test_handler_slot_runs_before_listeners() {
        let source = connection();
        let log = Log::default();

        source.add_event_listener("message", recorder(&log, "first"));
        source.add_event_listener("message", recorder(&log, "second"));
        source.set_onmessage(Some(recorder(&log, "slot")));
        source.dispatch_event(&Event::new("message", &source));

        assert_eq!(*log.lock(), vec!["slot:message", "first:message", "second:message"]);
    }

    #[test]
    fn test_custom_type_has_no_slot() {
        let source = connection();
        let log = Log::default();

        source.set_onmessage(Some(recorder(&log, "slot")));
        source.dispatch_event(&Event::new("customevent", &source));

        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_stop_immediate_propagation_in_first_listener() {
        let source = connection();
        let log = Log::default();

        source.add_event_listener(
            "open",
            Listener::new(|event: &Event| event.stop_immediate_propagation()),
        );
        source.add_event_listener("open", recorder(&log, "second"));
        source.dispatch_event(&Event::new("open", &source));

        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_stop_immediate_propagation_in_slot() {
        let source = connection();
        let log = Log::default();

        source.set_onerror(Some(Listener::new(|event: &Event| {
            event.stop_immediate_propagation();
        })));
        source.add_event_listener("error", recorder(&log, "listener"));
        source.dispatch_event(&Event::new("error", &source));

        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_stop_propagation_does_not_skip_listeners() {
        let source = connection();
        let log = Log::default();

        source.add_event_listener("open", Listener::new(|event: &Event| event.stop_propagation()));
        source.add_event_listener("open", recorder(&log, "second"));
        source.dispatch_event(&Event::new("open", &source));

        assert_eq!(*log.lock(), vec!["second:open"]);
    }

    #[test]
    fn test_phase_during_and_after_dispatch() {
        let source = connection();
        let phases = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&phases);

        source.add_event_listener(
            "open",
            Listener::new(move |event: &Event| seen.lock().push(event.event_phase())),
        );

        let event = Event::new("open", &source);
        assert_eq!(event.event_phase(), EventPhase::None);
        source.dispatch_event(&event);

        assert_eq!(*phases.lock(), vec![EventPhase::AtTarget]);
        assert_eq!(event.event_phase(), EventPhase::None);
    }

    #[test]
    fn test_failing_listener_does_not_abort_dispatch() {
        let source = connection();
        let log = Log::default();

        source.add_event_listener(
            "error",
            Listener::try_new(|_: &Event| Err(io::Error::other("boom").into())),
        );
        source.add_event_listener("error", Listener::new(|_: &Event| panic!("listener panic")));
        source.add_event_listener("error", recorder(&log, "last"));

        let prevented = source.dispatch_event(&Event::new("error", &source));

        assert!(!prevented);
        assert_eq!(*log.lock(), vec!["last:error"]);
    }

    /// Log sink for a scoped subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_listener_failure_is_logged() {
        let source = connection();
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_env_filter(tracing_subscriber::EnvFilter::new("error"))
            .with_ansi(false)
            .finish();

        source.add_event_listener(
            "message",
            Listener::try_new(|_: &Event| Err(io::Error::other("boom").into())),
        );
        tracing::subscriber::with_default(subscriber, || {
            source.dispatch_event(&Event::new("message", &source));
        });

        let output = String::from_utf8(captured.0.lock().clone()).expect("utf-8 log");
        assert!(output.contains("Listener failed"));
        assert!(output.contains("boom"));
        assert!(output.contains("event_type=\"message\"") || output.contains("event_type=message"));
    }

    #[test]
    fn test_failing_slot_does_not_abort_dispatch() {
        let source = connection();
        let log = Log::default();

        source.set_onopen(Some(Listener::try_new(|_: &Event| Err("slot failed".into()))));
        source.add_event_listener("open", recorder(&log, "listener"));
        source.dispatch_event(&Event::new("open", &source));

        assert_eq!(*log.lock(), vec!["listener:open"]);
    }

    #[test]
    fn test_handle_event_object() {
        struct Counter(Mutex<usize>);

        impl HandleEvent for Counter {
            fn handle_event(&self, _event: &Event) -> ListenerResult {
                *self.0.lock() += 1;
                Ok(())
            }
        }

        let source = connection();
        let counter = Arc::new(Counter(Mutex::new(0)));
        let listener = Listener::object(Arc::clone(&counter));

        source.add_event_listener("message", listener.clone());
        source.add_event_listener("message", listener);
        source.dispatch_event(&Event::new("message", &source));

        assert_eq!(*counter.0.lock(), 1);
    }

    #[test]
    fn test_dispatch_returns_prevented_for_cancelable() {
        let source = connection();
        source.add_event_listener("custom", Listener::new(|event: &Event| event.prevent_default()));

        let cancelable = Event::with_init("custom", &source, EventInit::new().with_cancelable());
        assert!(source.dispatch_event(&cancelable));

        let plain = Event::new("custom", &source);
        assert!(!source.dispatch_event(&plain));
        assert!(!plain.default_prevented());
    }

    #[test]
    fn test_listener_added_during_dispatch_runs_next_time() {
        let source = connection();
        let log = Log::default();
        let late = recorder(&log, "late");
        source.add_event_listener(
            "open",
            Listener::new(move |event: &Event| {
                event.target().add_event_listener("open", late.clone());
            }),
        );

        source.dispatch_event(&Event::new("open", &source));
        assert!(log.lock().is_empty());

        source.dispatch_event(&Event::new("open", &source));
        assert_eq!(*log.lock(), vec!["late:open"]);
    }

    #[test]
    fn test_listener_removed_during_dispatch_is_skipped() {
        let source = connection();
        let log = Log::default();
        let second = recorder(&log, "second");
        let removed = second.clone();

        source.add_event_listener(
            "open",
            Listener::new(move |event: &Event| {
                event.target().remove_event_listener("open", &removed);
            }),
        );
        source.add_event_listener("open", second.clone());
        source.add_event_listener("open", recorder(&log, "third"));

        source.dispatch_event(&Event::new("open", &source));

        assert_eq!(*log.lock(), vec!["third:open"]);
        assert!(!source.listeners(Some("open")).contains(&second));
    }

    #[test]
    fn test_slot_removing_listener_skips_it() {
        let source = connection();
        let log = Log::default();
        let listener = recorder(&log, "listener");
        let removed = listener.clone();

        source.set_onmessage(Some(Listener::new(move |event: &Event| {
            event.target().remove_event_listener("message", &removed);
        })));
        source.add_event_listener("message", listener);
        source.dispatch_event(&Event::new("message", &source));

        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_listener_using_event_target_does_not_leak() {
        let source = connection();
        let removed = Listener::new(|_: &Event| {});
        let captured = removed.clone();

        source.add_event_listener(
            "open",
            Listener::new(move |event: &Event| {
                event.target().remove_event_listener("open", &captured);
            }),
        );
        source.dispatch_event(&Event::new("open", &source));

        assert_eq!(Arc::strong_count(&source.inner), 1);
    }

    #[test]
    fn test_close_dispatches_nothing() {
        let source = connection();
        let log = Log::default();

        source.set_onerror(Some(recorder(&log, "slot")));
        source.add_event_listener("error", recorder(&log, "listener"));
        source.close();

        assert_eq!(source.ready_state(), EventSource::CLOSED);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let source = connection();
        let log = Log::default();

        source.add_event_listener("open", recorder(&log, "l"));
        source.add_event_listener("error", recorder(&log, "l"));

        source.announce_connection();
        assert_eq!(source.ready_state(), ReadyState::Open);

        source.reestablish_connection();
        assert_eq!(source.ready_state(), ReadyState::Connecting);

        source.fail_connection();
        assert_eq!(source.ready_state(), ReadyState::Closed);

        assert_eq!(*log.lock(), vec!["l:open", "l:error", "l:error"]);
    }

    #[test]
    fn test_listeners_snapshot() {
        let source = connection();
        let a = Listener::new(|_: &Event| {});
        let b = Listener::new(|_: &Event| {});

        source.add_event_listener("open", a.clone());
        source.add_event_listener("error", b.clone());

        assert_eq!(source.listeners(None), vec![a.clone(), b.clone()]);
        assert_eq!(source.listeners(Some("error")), vec![b]);
        assert!(source.listeners(Some("message")).is_empty());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}

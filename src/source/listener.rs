//! Event listeners and handler slots.
//!
//! A [`Listener`] is either a callback or an object implementing
//! [`HandleEvent`]. Listeners are compared by identity: cloning a listener
//! yields the same listener, creating a new one from the same closure does not.
//!
//! # Example
//!
//! ```
//! use fake_eventsource::{Event, Listener};
//!
//! let on_message = Listener::new(|event: &Event| {
//!     println!("received {:?}", event.data());
//! });
//!
//! assert_eq!(on_message, on_message.clone());
//! assert_ne!(on_message, Listener::new(|_: &Event| {}));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::ptr;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::ListenerError;
use crate::event::Event;

// ============================================================================
// Types
// ============================================================================

/// Result returned by listeners and handler slots.
pub type ListenerResult = Result<(), ListenerError>;

/// Callback listener signature.
type Callback = dyn Fn(&Event) -> ListenerResult + Send + Sync;

// ============================================================================
// HandleEvent
// ============================================================================

/// Object-style listener, the counterpart of a DOM `EventListener` object.
pub trait HandleEvent: Send + Sync {
    /// Called for every matching event.
    fn handle_event(&self, event: &Event) -> ListenerResult;
}

// ============================================================================
// Listener
// ============================================================================

/// A registered listener.
///
/// A callback that captures a clone of the `EventSource` it is registered on
/// keeps that connection alive forever: the connection owns the listener and
/// the listener owns the connection. Use [`Event::target`] inside the
/// callback to reach the connection instead.
#[derive(Clone)]
pub enum Listener {
    /// Plain callback.
    Callback(Arc<Callback>),
    /// Object exposing `handle_event`.
    Object(Arc<dyn HandleEvent>),
}

impl Listener {
    /// Creates a listener from an infallible callback.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(move |event: &Event| {
            f(event);
            Ok(())
        }))
    }

    /// Creates a listener from a fallible callback.
    ///
    /// Errors are logged by the dispatcher and never propagated.
    #[must_use]
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(&Event) -> ListenerResult + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }

    /// Wraps a [`HandleEvent`] object.
    ///
    /// Keep a clone of the `Arc` to inspect the object after dispatch.
    #[must_use]
    pub fn object<H>(handler: Arc<H>) -> Self
    where
        H: HandleEvent + 'static,
    {
        Self::Object(handler)
    }

    /// Returns `true` if both handles refer to the same listener.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Callback(a), Self::Callback(b)) => ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Self::Object(a), Self::Object(b)) => ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }

    /// Runs the listener.
    pub(crate) fn call(&self, event: &Event) -> ListenerResult {
        match self {
            Self::Callback(f) => f(event),
            Self::Object(handler) => handler.handle_event(event),
        }
    }

    fn addr(&self) -> *const () {
        match self {
            Self::Callback(f) => Arc::as_ptr(f).cast(),
            Self::Object(h) => Arc::as_ptr(h).cast(),
        }
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Callback(_) => "Callback",
            Self::Object(_) => "Object",
        };
        write!(f, "Listener::{kind}({:p})", self.addr())
    }
}

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Listeners by event type.
///
/// Types keep the order of their first registration; listeners keep
/// insertion order within a type and are never duplicated.
#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    index: FxHashMap<String, usize>,
    entries: Vec<(String, Vec<Listener>)>,
}

impl ListenerRegistry {
    /// Appends `listener` unless already registered. Returns `true` if added.
    pub(crate) fn add(&mut self, event_type: &str, listener: Listener) -> bool {
        let slot = match self.index.get(event_type) {
            Some(&slot) => slot,
            None => {
                self.entries.push((event_type.to_string(), Vec::new()));
                let slot = self.entries.len() - 1;
                self.index.insert(event_type.to_string(), slot);
                slot
            }
        };

        let listeners = &mut self.entries[slot].1;
        if listeners.contains(&listener) {
            return false;
        }

        listeners.push(listener);
        true
    }

    /// Removes `listener`. Returns `true` if it was registered.
    pub(crate) fn remove(&mut self, event_type: &str, listener: &Listener) -> bool {
        let Some(&slot) = self.index.get(event_type) else {
            return false;
        };

        let listeners = &mut self.entries[slot].1;
        match listeners.iter().position(|l| l == listener) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `listener` is registered for `event_type`.
    pub(crate) fn contains(&self, event_type: &str, listener: &Listener) -> bool {
        self.index
            .get(event_type)
            .is_some_and(|&slot| self.entries[slot].1.contains(listener))
    }

    /// Snapshot of the listeners for one type.
    pub(crate) fn for_type(&self, event_type: &str) -> Vec<Listener> {
        self.index
            .get(event_type)
            .map(|&slot| self.entries[slot].1.clone())
            .unwrap_or_default()
    }

    /// Snapshot of every listener, grouped by type in registration order.
    pub(crate) fn all(&self) -> Vec<Listener> {
        self.entries
            .iter()
            .flat_map(|(_, listeners)| listeners.iter().cloned())
            .collect()
    }
}

// ============================================================================
// HandlerSlot
// ============================================================================

/// The `on<type>` handler properties of an `EventSource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerSlot {
    /// `onopen`
    Open,
    /// `onmessage`
    Message,
    /// `onerror`
    Error,
}

/// Event type to handler slot.
const HANDLER_SLOTS: [(&str, HandlerSlot); 3] = [
    ("open", HandlerSlot::Open),
    ("message", HandlerSlot::Message),
    ("error", HandlerSlot::Error),
];

impl HandlerSlot {
    /// Returns the slot invoked for `event_type`, if any.
    #[must_use]
    pub fn for_event_type(event_type: &str) -> Option<Self> {
        HANDLER_SLOTS
            .iter()
            .find(|(name, _)| *name == event_type)
            .map(|&(_, slot)| slot)
    }

    /// The event type this slot handles.
    #[inline]
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Message => "message",
            Self::Error => "error",
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Storage for the three handler slots.
#[derive(Debug, Default)]
pub(crate) struct HandlerSlots([Option<Listener>; 3]);

impl HandlerSlots {
    pub(crate) fn get(&self, slot: HandlerSlot) -> Option<Listener> {
        self.0[slot.index()].clone()
    }

    pub(crate) fn set(&mut self, slot: HandlerSlot, handler: Option<Listener>) {
        self.0[slot.index()] = handler;
    }
}

// ============================================================================
// Tests
// ============================================================================

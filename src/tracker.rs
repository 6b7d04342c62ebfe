//! Registry of every connection created during a test.
//!
//! Each fake connection is wrapped in an [`EventSourceProxy`] and appended
//! here when it is constructed, so a test can reach connections opened by
//! the code under test.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          ConnectionRegistry             │
//! │  ┌─────────────────────────────────┐   │
//! │  │ 0 → Proxy(EventSource #1)       │ ◄─ first()
//! │  │ 1 → Proxy(EventSource #2)       │ ◄─ at(1)
//! │  │ 2 → Proxy(EventSource #3)       │ ◄─ most_recent()
//! │  └─────────────────────────────────┘   │
//! └─────────────────────────────────────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::source::{EventSource, EventSourceProxy};

// ============================================================================
// ConnectionRegistry
// ============================================================================

/// Ordered record of tracked connections.
///
/// Clones share the same record. Entries are only ever appended or cleared
/// in bulk with [`ConnectionRegistry::reset`].
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    entries: Arc<RwLock<Vec<EventSourceProxy>>>,
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("count", &self.count())
            .finish()
    }
}

// ============================================================================
// ConnectionRegistry - Public API
// ============================================================================

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `source` in a proxy and appends it.
    pub fn track(&self, source: &EventSource) -> EventSourceProxy {
        let proxy = EventSourceProxy::new(source.clone());
        let mut entries = self.entries.write();
        entries.push(proxy.clone());

        trace!(connection = %source.id(), index = entries.len() - 1, "Connection tracked");
        proxy
    }

    /// Removes every entry.
    pub fn reset(&self) {
        let cleared = std::mem::take(&mut *self.entries.write()).len();
        debug!(cleared, "Connection registry reset");
    }

    /// Returns the most recently created connection.
    #[must_use]
    pub fn most_recent(&self) -> Option<EventSourceProxy> {
        self.entries.read().last().cloned()
    }

    /// Returns the first created connection.
    #[must_use]
    pub fn first(&self) -> Option<EventSourceProxy> {
        self.entries.read().first().cloned()
    }

    /// Returns the connection at `index` in creation order.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<EventSourceProxy> {
        self.entries.read().get(index).cloned()
    }

    /// Returns the number of tracked connections.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no connection is tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a snapshot of every tracked connection.
    #[must_use]
    pub fn all(&self) -> Vec<EventSourceProxy> {
        self.entries.read().clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Fake `EventSource` connections.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventSource`] | The connection application code talks to |
//! | [`EventSourceProxy`] | Test-side control surface |
//! | [`Listener`] | Callback or [`HandleEvent`] object |
//! | [`ReadyState`] | `CONNECTING` / `OPEN` / `CLOSED` |
//!
//! # Lifecycle
//!
//! ```text
//!              first emit
//!  CONNECTING ────────────► OPEN
//!      ▲ │                   │
//!      │ └─── reestablish ◄──┘
//!      │                     │
//!      └─ fail / close ─► CLOSED ◄─ fail / close
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// The connection and its dispatch algorithm.
pub mod connection;

/// Listeners and handler slots.
pub mod listener;

/// Test-side control surface.
pub mod proxy;

/// Readiness state and CORS mode.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{EventSource, EventSourceInit};
pub use listener::{HandleEvent, HandlerSlot, Listener, ListenerResult};
pub use proxy::EventSourceProxy;
pub use state::{CorsMode, ReadyState};

//! Fake EventSource - An in-process test double for server-sent events.
//!
//! This library stands in for a browser `EventSource` so that code consuming
//! server-sent events can be tested without a server. The test plays the
//! server through a proxy attached to every connection the code under test
//! opens.
//!
//! # Architecture
//!
//! The fake follows an application/test split:
//!
//! - **Application side**: Opens connections through a [`ConstructorBinding`],
//!   registers listeners, reads [`ReadyState`]
//! - **Test side**: Installs an [`SseMock`], finds connections in the
//!   [`ConnectionRegistry`], drives them through [`EventSourceProxy`]
//!
//! Key design principles:
//!
//! - Dispatch is synchronous: a listener has run when `emit` returns
//! - Listener failures are logged and never reach the emitter
//! - No global state: the binding and the registry are explicit handles
//!
//! # Quick Start
//!
//! ```
//! use fake_eventsource::{Event, Listener, ReadyState, Result, SseMock};
//!
//! fn main() -> Result<()> {
//!     let mock = SseMock::builder().base_url("http://localhost:9876").build()?;
//!
//!     mock.with_mock(|connections| -> Result<()> {
//!         // Application code opens a connection through the binding
//!         let source = mock.binding().construct("/updates", Default::default())?;
//!         source.set_onmessage(Some(Listener::new(|event: &Event| {
//!             println!("update: {:?}", event.data());
//!         })));
//!
//!         // The test plays the server
//!         let server = connections.most_recent().expect("connection opened");
//!         server.emit("ready")?;
//!         assert_eq!(source.ready_state(), ReadyState::Open);
//!
//!         server.fail_connection();
//!         assert_eq!(source.ready_state(), ReadyState::Closed);
//!         Ok(())
//!     })??;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`event`] | [`Event`] and [`MessageEvent`] |
//! | [`source`] | [`EventSource`], [`EventSourceProxy`], listeners |
//! | [`mock`] | [`SseMock`] installer and constructors |
//! | [`tracker`] | [`ConnectionRegistry`] |
//! | [`resolver`] | URL resolution and serialization |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Events delivered to listeners.
pub mod event;

/// Type-safe identifiers.
pub mod identifiers;

/// Installing the fake.
///
/// Use [`SseMock::builder()`] to create a configured mock.
pub mod mock;

/// URL resolution against a base URL.
pub mod resolver;

/// Fake connections and their test-side proxies.
///
/// - [`EventSource`] - What application code holds
/// - [`EventSourceProxy`] - What the test drives
/// - [`Listener`] - Callback or [`HandleEvent`] object
pub mod source;

/// Registry of created connections.
pub mod tracker;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, ListenerError, Result};

// Event types
pub use event::{Event, EventInit, EventPhase, MessageDescriptor, MessageEvent};

// Identifier types
pub use identifiers::ConnectionId;

// Mock types
pub use mock::{
    ConstructorBinding, EventSourceConstructor, FakeEventSourceFactory, SseMock, SseMockBuilder,
    UnavailableConstructor,
};

// URL types
pub use resolver::{UrlRecord, UrlResolver};

// Connection types
pub use source::{
    CorsMode, EventSource, EventSourceInit, EventSourceProxy, HandleEvent, HandlerSlot, Listener,
    ListenerResult, ReadyState,
};

// Tracking
pub use tracker::ConnectionRegistry;

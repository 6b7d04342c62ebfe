//! Installing the fake in place of a real `EventSource` constructor.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SseMock`] | Installs and uninstalls the fake |
//! | [`SseMockBuilder`] | Fluent configuration builder |
//! | [`ConstructorBinding`] | Swappable constructor slot used by application code |
//! | [`FakeEventSourceFactory`] | Creates and tracks fake connections |
//!
//! # Example
//!
//! ```
//! use fake_eventsource::SseMock;
//!
//! let mock = SseMock::builder().build().unwrap();
//! mock.with_mock(|connections| {
//!     mock.binding().construct("/stream", Default::default()).unwrap();
//!     assert_eq!(connections.count(), 1);
//! })
//! .unwrap();
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for mock configuration.
pub mod builder;

/// Install, uninstall and scoped installation.
pub mod core;

/// Constructors and the swappable binding.
pub mod factory;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::SseMock;
pub use builder::SseMockBuilder;
pub use factory::{
    ConstructorBinding, EventSourceConstructor, FakeEventSourceFactory, UnavailableConstructor,
};

//! Error types for the fake `EventSource`.
//!
//! This module defines all error types used throughout the crate.
//! Messages mirror the wording a browser uses for the same misuse so that
//! assertions written against the real API read the same against the fake.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use fake_eventsource::{Result, SseMock};
//!
//! fn example(mock: &SseMock) -> Result<()> {
//!     mock.install()?;
//!     let proxy = mock.connections().most_recent().expect("connection");
//!     proxy.emit("hello")?;
//!     mock.uninstall()
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Construction | [`Error::Syntax`], [`Error::Unsupported`] |
//! | Emit | [`Error::InvalidMessage`], [`Error::EmitOnClosed`], [`Error::Json`] |
//! | Lifecycle | [`Error::AlreadyInstalled`], [`Error::NotInstalled`] |
//! | Configuration | [`Error::Config`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

/// Error type returned by listeners and handler slots.
///
/// These errors are caught and logged during dispatch; they never reach
/// the caller of `dispatch_event`.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// The connection URL cannot be resolved.
    ///
    /// Returned when constructing an `EventSource` with an empty or invalid URL.
    #[error("Failed to construct 'EventSource': The URL '{url}' is invalid.")]
    Syntax {
        /// The rejected URL, as given.
        url: String,
    },

    /// No `EventSource` implementation is bound.
    ///
    /// Returned by the default constructor binding before a mock is installed.
    #[error("Failed to construct 'EventSource': EventSource is not supported in this environment.")]
    Unsupported,

    // ========================================================================
    // Emit Errors
    // ========================================================================
    /// The emitted message is absent.
    #[error("Failed to emit message on 'EventSource': The message is {message}.")]
    InvalidMessage {
        /// Rendering of the rejected message.
        message: String,
    },

    /// The connection is closed.
    #[error("Failed to emit message on 'EventSource': The connection state is CLOSED.")]
    EmitOnClosed,

    /// A structured message could not be read as a message descriptor.
    #[error("Failed to emit message on 'EventSource': {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The fake was installed twice.
    #[error(
        "The fake EventSource is already installed, make sure `uninstall()` \
         has been called after the previous test."
    )]
    AlreadyInstalled,

    /// The fake was uninstalled without being installed.
    #[error(
        "The fake EventSource is not installed, make sure `install()` \
         has been called before uninstalling it."
    )]
    NotInstalled,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when mock configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a syntax error for an invalid URL.
    #[inline]
    pub fn syntax(url: impl Into<String>) -> Self {
        Self::Syntax { url: url.into() }
    }

    /// Creates an invalid message error.
    #[inline]
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error was raised by `emit`.
    #[inline]
    #[must_use]
    pub fn is_emit_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMessage { .. } | Self::EmitOnClosed | Self::Json(_)
        )
    }

    /// Returns `true` if this is an install/uninstall misuse.
    #[inline]
    #[must_use]
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self, Self::AlreadyInstalled | Self::NotInstalled)
    }
}

// ============================================================================
// Tests
// ============================================================================

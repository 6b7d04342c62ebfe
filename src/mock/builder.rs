//! Builder pattern for mock configuration.
//!
//! Provides a fluent API for configuring and creating [`SseMock`] instances.
//!
//! # Example
//!
//! ```
//! use fake_eventsource::{ConstructorBinding, SseMock};
//!
//! # fn example() -> fake_eventsource::Result<()> {
//! let binding = ConstructorBinding::default();
//! let mock = SseMock::builder()
//!     .base_url("http://localhost:9876")
//!     .binding(binding.clone())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::resolver::UrlResolver;
use crate::tracker::ConnectionRegistry;

use super::core::SseMock;
use super::factory::{ConstructorBinding, FakeEventSourceFactory};

// ============================================================================
// SseMockBuilder
// ============================================================================

/// Builder for configuring an [`SseMock`] instance.
///
/// Use [`SseMock::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct SseMockBuilder {
    /// Base URL relative connection URLs resolve against.
    base_url: Option<String>,
    /// Binding swapped on install.
    binding: Option<ConstructorBinding>,
    /// Registry shared with other components.
    registry: Option<ConnectionRegistry>,
}

// ============================================================================
// SseMockBuilder Implementation
// ============================================================================

impl SseMockBuilder {
    /// Creates a new builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL relative connection URLs resolve against.
    ///
    /// Defaults to [`DEFAULT_BASE_URL`](crate::resolver::DEFAULT_BASE_URL).
    #[inline]
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the binding the mock installs itself into.
    ///
    /// Defaults to a fresh binding with no `EventSource` support.
    #[inline]
    #[must_use]
    pub fn binding(mut self, binding: ConstructorBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Sets the registry connections are tracked in.
    #[inline]
    #[must_use]
    pub fn registry(mut self, registry: ConnectionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the mock with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the base URL is not
    /// an absolute URL.
    pub fn build(self) -> Result<SseMock> {
        let resolver = self.validate_base_url()?;
        let factory = FakeEventSourceFactory::new(resolver, self.registry.unwrap_or_default());

        Ok(SseMock::new(self.binding.unwrap_or_default(), factory))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SseMockBuilder {
    fn validate_base_url(&self) -> Result<UrlResolver> {
        match &self.base_url {
            Some(base) => UrlResolver::new(base),
            None => Ok(UrlResolver::default()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

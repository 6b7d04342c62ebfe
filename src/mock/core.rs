//! Installer that swaps the fake into a [`ConstructorBinding`].
//!
//! The [`SseMock`] struct owns a [`FakeEventSourceFactory`] and the binding
//! it swaps that factory into. While installed, every connection the code
//! under test opens through the binding is a fake tracked in
//! [`SseMock::connections`].
//!
//! # Example
//!
//! ```
//! use fake_eventsource::{ConstructorBinding, SseMock};
//!
//! # fn example() -> fake_eventsource::Result<()> {
//! let binding = ConstructorBinding::default();
//! let mock = SseMock::builder().binding(binding.clone()).build()?;
//!
//! mock.install()?;
//! let source = binding.construct("/stream", Default::default())?;
//! assert_eq!(mock.connections().count(), 1);
//! mock.uninstall()?;
//!
//! assert!(binding.construct("/stream", Default::default()).is_err());
//! # drop(source);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tracker::ConnectionRegistry;

use super::builder::SseMockBuilder;
use super::factory::{
    ConstructorBinding, EventSourceConstructor, FakeEventSourceFactory, UnavailableConstructor,
};

// ============================================================================
// SseMock
// ============================================================================

/// Swaps a fake `EventSource` constructor in and out of a binding.
///
/// Installing resets the connection registry so every test starts from an
/// empty record; uninstalling restores the previous constructor and resets
/// it again.
pub struct SseMock {
    /// Binding the fake is swapped into.
    binding: ConstructorBinding,

    /// Factory creating and tracking fakes.
    factory: FakeEventSourceFactory,

    /// The factory as installed, kept for identity checks.
    fake: Arc<dyn EventSourceConstructor>,

    /// Constructor that was bound before [`SseMock::install`].
    previous: Mutex<Option<Arc<dyn EventSourceConstructor>>>,
}

impl fmt::Debug for SseMock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseMock")
            .field("installed", &self.is_installed())
            .field("connections", &self.factory.registry().count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SseMock - Construction
// ============================================================================

impl SseMock {
    /// Creates a configuration builder for the mock.
    #[inline]
    #[must_use]
    pub fn builder() -> SseMockBuilder {
        SseMockBuilder::new()
    }

    pub(crate) fn new(binding: ConstructorBinding, factory: FakeEventSourceFactory) -> Self {
        let fake: Arc<dyn EventSourceConstructor> = Arc::new(factory.clone());
        Self {
            binding,
            factory,
            fake,
            previous: Mutex::new(None),
        }
    }
}

// ============================================================================
// SseMock - Accessors
// ============================================================================

impl SseMock {
    /// Returns the registry of connections created while installed.
    #[inline]
    #[must_use]
    pub fn connections(&self) -> &ConnectionRegistry {
        self.factory.registry()
    }

    /// Returns the binding the fake is swapped into.
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &ConstructorBinding {
        &self.binding
    }

    /// Returns the fake factory.
    #[inline]
    #[must_use]
    pub fn factory(&self) -> &FakeEventSourceFactory {
        &self.factory
    }

    /// Returns `true` if the fake is currently bound.
    #[inline]
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.binding.is_bound_to(&self.fake)
    }
}

// ============================================================================
// SseMock - Lifecycle
// ============================================================================

impl SseMock {
    /// Binds the fake and clears the connection registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInstalled`] if the fake is already bound.
    pub fn install(&self) -> Result<()> {
        if self.is_installed() {
            return Err(Error::AlreadyInstalled);
        }

        let previous = self.binding.replace(Arc::clone(&self.fake));
        *self.previous.lock() = Some(previous);
        self.connections().reset();

        debug!("Fake EventSource installed");
        Ok(())
    }

    /// Restores the previous constructor and clears the connection registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInstalled`] if the fake is not bound.
    pub fn uninstall(&self) -> Result<()> {
        if !self.is_installed() {
            return Err(Error::NotInstalled);
        }

        let previous = self
            .previous
            .lock()
            .take()
            .unwrap_or_else(|| Arc::new(UnavailableConstructor));
        self.binding.replace(previous);
        self.connections().reset();

        debug!("Fake EventSource uninstalled");
        Ok(())
    }

    /// Runs `f` with the fake installed.
    ///
    /// The fake is uninstalled when `f` returns or unwinds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInstalled`] if the fake is already bound;
    /// `f` is not run in that case.
    pub fn with_mock<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ConnectionRegistry) -> T,
    {
        self.install()?;
        let _guard = InstallGuard { mock: self };
        Ok(f(self.connections()))
    }
}

// ============================================================================
// InstallGuard
// ============================================================================

/// Uninstalls the mock on drop.
struct InstallGuard<'a> {
    mock: &'a SseMock,
}

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.mock.uninstall() {
            warn!(error = %e, "Scoped uninstall failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

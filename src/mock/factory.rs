//! Connection constructors and the binding application code calls.
//!
//! Application code never names the fake directly. It constructs its
//! connections through a [`ConstructorBinding`], and tests point that binding
//! at a [`FakeEventSourceFactory`] (see [`SseMock`](crate::SseMock)).
//!
//! # Example
//!
//! ```
//! use fake_eventsource::{EventSourceInit, FakeEventSourceFactory};
//!
//! let factory = FakeEventSourceFactory::with_base_url("http://localhost:9876").unwrap();
//! let source = factory.create("/stream", EventSourceInit::new()).unwrap();
//!
//! assert_eq!(source.url(), "http://localhost:9876/stream");
//! assert_eq!(factory.registry().count(), 1);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::ptr;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::resolver::UrlResolver;
use crate::source::{EventSource, EventSourceInit};
use crate::tracker::ConnectionRegistry;

// ============================================================================
// EventSourceConstructor
// ============================================================================

/// Something that can open an `EventSource`.
pub trait EventSourceConstructor: Send + Sync {
    /// Opens a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if `url` is invalid.
    fn construct(&self, url: &str, init: EventSourceInit) -> Result<EventSource>;
}

/// Constructor of an environment without `EventSource` support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableConstructor;

impl EventSourceConstructor for UnavailableConstructor {
    fn construct(&self, _url: &str, _init: EventSourceInit) -> Result<EventSource> {
        Err(Error::Unsupported)
    }
}

// ============================================================================
// FakeEventSourceFactory
// ============================================================================

/// Creates fake connections and records them in a [`ConnectionRegistry`].
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct FakeEventSourceFactory {
    resolver: UrlResolver,
    registry: ConnectionRegistry,
}

impl FakeEventSourceFactory {
    /// Creates a factory from its parts.
    #[inline]
    #[must_use]
    pub fn new(resolver: UrlResolver, registry: ConnectionRegistry) -> Self {
        Self { resolver, registry }
    }

    /// Creates a factory resolving relative URLs against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base` is not an absolute URL.
    pub fn with_base_url(base: &str) -> Result<Self> {
        Ok(Self::new(UrlResolver::new(base)?, ConnectionRegistry::new()))
    }

    /// Returns the URL resolver.
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Returns the registry connections are tracked in.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Creates and tracks a connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if `url` is empty or cannot be resolved.
    pub fn create(&self, url: &str, init: EventSourceInit) -> Result<EventSource> {
        let record = self.resolver.resolve(url)?;
        let source = EventSource::new(record, init);
        self.registry.track(&source);
        Ok(source)
    }
}

impl EventSourceConstructor for FakeEventSourceFactory {
    fn construct(&self, url: &str, init: EventSourceInit) -> Result<EventSource> {
        self.create(url, init)
    }
}

// ============================================================================
// ConstructorBinding
// ============================================================================

/// Shared, swappable slot holding the constructor application code uses.
///
/// Clones share the slot, so a binding handed to the code under test sees
/// the fake as soon as a test installs it.
#[derive(Clone)]
pub struct ConstructorBinding {
    current: Arc<RwLock<Arc<dyn EventSourceConstructor>>>,
}

impl Default for ConstructorBinding {
    fn default() -> Self {
        Self::new(Arc::new(UnavailableConstructor))
    }
}

impl fmt::Debug for ConstructorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorBinding")
            .field("current", &Arc::as_ptr(&*self.current.read()).cast::<()>())
            .finish()
    }
}

impl ConstructorBinding {
    /// Creates a binding to `constructor`.
    #[must_use]
    pub fn new(constructor: Arc<dyn EventSourceConstructor>) -> Self {
        Self {
            current: Arc::new(RwLock::new(constructor)),
        }
    }

    /// Opens a connection with the bound constructor.
    ///
    /// # Errors
    ///
    /// Whatever the bound constructor returns.
    pub fn construct(&self, url: &str, init: EventSourceInit) -> Result<EventSource> {
        let constructor = Arc::clone(&*self.current.read());
        constructor.construct(url, init)
    }

    /// Returns the bound constructor.
    #[must_use]
    pub fn current(&self) -> Arc<dyn EventSourceConstructor> {
        Arc::clone(&*self.current.read())
    }

    /// Returns `true` if `constructor` is the bound one.
    #[must_use]
    pub fn is_bound_to(&self, constructor: &Arc<dyn EventSourceConstructor>) -> bool {
        ptr::addr_eq(Arc::as_ptr(&*self.current.read()), Arc::as_ptr(constructor))
    }

    /// Binds `constructor`, returning the previous one.
    pub(crate) fn replace(
        &self,
        constructor: Arc<dyn EventSourceConstructor>,
    ) -> Arc<dyn EventSourceConstructor> {
        debug!("EventSource constructor rebound");
        std::mem::replace(&mut *self.current.write(), constructor)
    }
}

// ============================================================================
// Tests
// ============================================================================

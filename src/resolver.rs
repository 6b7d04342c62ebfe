//! Connection URL resolution.
//!
//! Resolves the URL handed to the `EventSource` constructor against a base
//! URL (the "page" the code under test pretends to run on) and keeps the
//! result as a structured [`UrlRecord`].
//!
//! # Example
//!
//! ```
//! use fake_eventsource::UrlResolver;
//!
//! let resolver = UrlResolver::new("http://localhost:9876").unwrap();
//! let record = resolver.resolve("/stream").unwrap();
//!
//! assert_eq!(record.to_string(), "http://localhost:9876/stream");
//! assert_eq!(record.origin(), "http://localhost:9876");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9876/";

// ============================================================================
// UrlRecord
// ============================================================================

/// A resolved URL split into its components.
///
/// Components follow the conventions of the browser `URL` interface:
/// `protocol` keeps its trailing `:`, `search` and `hash` keep their
/// leading `?` / `#` and are empty when absent, and `host` includes the
/// port when the port is not the scheme default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Scheme followed by `:` (e.g. `http:`).
    pub protocol: String,
    /// Username, empty when absent.
    pub username: String,
    /// Password, empty when absent.
    pub password: String,
    /// Hostname with optional `:port`, `None` when the URL has no host.
    pub host: Option<String>,
    /// Hostname without port.
    pub hostname: Option<String>,
    /// Port, `None` when absent or equal to the scheme default.
    pub port: Option<String>,
    /// Path, always starting with `/`.
    pub pathname: String,
    /// Query string including `?`, or empty.
    pub search: String,
    /// Fragment including `#`, or empty.
    pub hash: String,
}

impl UrlRecord {
    /// Builds a record from a parsed [`Url`].
    fn from_url(url: &Url) -> Self {
        let hostname = url.host_str().filter(|h| !h.is_empty()).map(str::to_string);
        let port = url.port().map(|p| p.to_string());
        let host = hostname.as_ref().map(|name| match &port {
            Some(port) => format!("{name}:{port}"),
            None => name.clone(),
        });

        let mut pathname = url.path().to_string();
        if !pathname.starts_with('/') {
            pathname.insert(0, '/');
        }

        Self {
            protocol: format!("{}:", url.scheme()),
            username: url.username().to_string(),
            password: url.password().unwrap_or_default().to_string(),
            host,
            hostname,
            port,
            pathname,
            search: prefixed('?', url.query()),
            hash: prefixed('#', url.fragment()),
        }
    }

    /// Returns the origin: protocol, `//` and host.
    ///
    /// URLs without a host have the opaque origin `"null"`.
    #[must_use]
    pub fn origin(&self) -> String {
        match &self.host {
            Some(host) => format!("{}//{}", self.protocol, host),
            None => "null".to_string(),
        }
    }
}

impl fmt::Display for UrlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.protocol)?;

        if self.host.is_some() {
            f.write_str("//")?;

            if !self.username.is_empty() || !self.password.is_empty() {
                f.write_str(&self.username)?;
                if !self.password.is_empty() {
                    write!(f, ":{}", self.password)?;
                }
                f.write_str("@")?;
            }

            f.write_str(self.hostname.as_deref().unwrap_or_default())?;
            if let Some(port) = &self.port {
                write!(f, ":{port}")?;
            }
        } else if self.protocol == "file:" {
            f.write_str("//")?;
        }

        f.write_str(&self.pathname)?;
        f.write_str(&self.search)?;
        f.write_str(&self.hash)
    }
}

/// Returns `prefix + value` for a non-empty value, or an empty string.
fn prefixed(prefix: char, value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("{prefix}{v}"),
        _ => String::new(),
    }
}

// ============================================================================
// UrlResolver
// ============================================================================

/// Resolves connection URLs against a base URL.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    /// Base for relative URLs; `None` accepts absolute URLs only.
    base: Option<Url>,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_BASE_URL).ok(),
        }
    }
}

impl UrlResolver {
    /// Creates a resolver for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| Error::config(format!("invalid base URL '{base}': {e}")))?;

        if base.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base URL '{base}' cannot be used to resolve relative URLs"
            )));
        }

        Ok(Self { base: Some(base) })
    }

    /// Creates a resolver that only accepts absolute URLs.
    #[inline]
    #[must_use]
    pub fn absolute_only() -> Self {
        Self { base: None }
    }

    /// Returns the base URL, if any.
    #[inline]
    #[must_use]
    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Resolves `input` into a [`UrlRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if `input` is empty or cannot be parsed.
    pub fn resolve(&self, input: &str) -> Result<UrlRecord> {
        if input.is_empty() {
            return Err(Error::syntax(input));
        }

        let url = Url::options()
            .base_url(self.base.as_ref())
            .parse(input)
            .map_err(|_| Error::syntax(input))?;

        Ok(UrlRecord::from_url(&url))
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Connection readiness and CORS mode.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ReadyState
// ============================================================================

/// Readiness of a connection.
///
/// `Closed` is terminal. `Open` may fall back to `Connecting` when the
/// connection is reestablished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// Not yet open, or reconnecting.
    #[default]
    Connecting = 0,
    /// Receiving events.
    Open = 1,
    /// Closed for good.
    Closed = 2,
}

impl ReadyState {
    /// Returns the numeric constant exposed by `readyState`.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the constant name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }

    /// Returns `true` for the terminal `CLOSED` state.
    #[inline]
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CorsMode
// ============================================================================

/// CORS attribute state derived from `withCredentials`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CorsMode {
    /// Credentials are not sent cross-origin.
    #[default]
    Anonymous,
    /// Credentials are always sent.
    UseCredentials,
}

impl CorsMode {
    /// Returns the attribute keyword.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::UseCredentials => "use-credentials",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values() {
        assert_eq!(ReadyState::Connecting.as_u8(), 0);
        assert_eq!(ReadyState::Open.as_u8(), 1);
        assert_eq!(ReadyState::Closed.as_u8(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(ReadyState::Closed.to_string(), "CLOSED");
        assert_eq!(ReadyState::default(), ReadyState::Connecting);
    }

    #[test]
    fn test_cors_mode_keywords() {
        assert_eq!(CorsMode::Anonymous.as_str(), "anonymous");
        assert_eq!(CorsMode::UseCredentials.as_str(), "use-credentials");
    }
}

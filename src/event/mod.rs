//! Fake event types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Event`] | Dispatched occurrence with phase and propagation flags |
//! | [`EventInit`] | Optional `bubbles` / `cancelable` / `composed` flags |
//! | [`MessageEvent`] | Payload, id and origin of a message event |
//! | [`MessageDescriptor`] | What a test emits |

// ============================================================================
// Submodules
// ============================================================================

/// The base event.
pub mod core;

/// Message events and descriptors.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{Event, EventInit, EventPhase};
pub use message::{MESSAGE_EVENT_TYPE, MessageDescriptor, MessageEvent};

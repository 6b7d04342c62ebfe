//! Message events and the descriptors they are built from.
//!
//! A test emits either a plain value (delivered as a `message` event whose
//! data is the value's string form) or a structured descriptor
//! `{ "type": ..., "id": ..., "data": ... }` that may name a custom event type.
//!
//! # Descriptor Format
//!
//! ```json
//! {
//!   "type": "customevent",
//!   "id": "42",
//!   "data": { "any": "json" }
//! }
//! ```
//!
//! Missing `type` defaults to `message`; missing `data` is `null`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::source::EventSource;

use super::core::{Event, EventInit};

// ============================================================================
// Constants
// ============================================================================

/// Event type used when a message does not name one.
pub const MESSAGE_EVENT_TYPE: &str = "message";

// ============================================================================
// MessageDescriptor
// ============================================================================

/// What to emit: event type, optional id and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Event type to dispatch.
    #[serde(rename = "type", default = "default_event_type")]
    pub event_type: String,

    /// Value exposed as `last_event_id`.
    #[serde(
        default,
        deserialize_with = "deserialize_event_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Payload.
    #[serde(default)]
    pub data: Value,
}

impl MessageDescriptor {
    /// Creates a `message` descriptor carrying `data`.
    #[inline]
    #[must_use]
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            event_type: default_event_type(),
            id: None,
            data: data.into(),
        }
    }

    /// Sets the event type.
    #[inline]
    #[must_use]
    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Sets the event id.
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builds a descriptor from an emitted value.
    ///
    /// Objects are read as descriptors (their fields override the defaults);
    /// any other value becomes the string data of a `message` event.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMessage`] if `payload` is `null`
    /// - [`Error::Json`] if an object has a non-string `type`
    pub fn from_payload(payload: Value) -> Result<Self> {
        match payload {
            Value::Null => Err(Error::invalid_message("null")),
            Value::Object(_) => Ok(serde_json::from_value(payload)?),
            other => Ok(Self::new(script_string(&other))),
        }
    }
}

fn default_event_type() -> String {
    MESSAGE_EVENT_TYPE.to_string()
}

/// Accepts string, number or boolean ids.
fn deserialize_event_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "event id must be a string, got {other}"
        ))),
    }
}

/// String conversion with script semantics: arrays join their elements with
/// `,` (nulls become empty), objects render as `[object Object]`.
pub(crate) fn script_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => script_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Whole floats render without a fractional part (`1.0` becomes `1`).
fn number_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

// ============================================================================
// MessageEvent
// ============================================================================

/// Message-specific part of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    data: Value,
    last_event_id: String,
    origin: String,
}

impl MessageEvent {
    /// The payload.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The payload when it is a string.
    #[inline]
    #[must_use]
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_str()
    }

    /// The event id, empty when none was given.
    #[inline]
    #[must_use]
    pub fn last_event_id(&self) -> &str {
        &self.last_event_id
    }

    /// Origin of the emitting connection.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Always empty.
    #[inline]
    #[must_use]
    pub fn ports(&self) -> &[Value] {
        &[]
    }

    /// Always `None`.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<&EventSource> {
        None
    }

    /// Kept for API parity with the deprecated DOM method.
    #[inline]
    pub fn init_message_event(&self) {}
}

// ============================================================================
// Event - Message Constructor
// ============================================================================

impl Event {
    /// Creates a message event for `target` from a descriptor.
    ///
    /// The origin is taken from the target's URL once, here.
    #[must_use]
    pub fn message(descriptor: MessageDescriptor, target: &EventSource) -> Self {
        let payload = MessageEvent {
            data: descriptor.data,
            last_event_id: descriptor.id.unwrap_or_default(),
            origin: target.url_record().origin(),
        };

        Self::build(descriptor.event_type, target, EventInit::new(), Some(payload))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::mock::FakeEventSourceFactory;

    fn target(url: &str) -> EventSource {
        FakeEventSourceFactory::default()
            .create(url, Default::default())
            .expect("create")
    }

    #[test]
    fn test_string_payload() {
        let descriptor = MessageDescriptor::from_payload(json!("hello")).expect("descriptor");
        assert_eq!(descriptor.event_type, "message");
        assert_eq!(descriptor.data, json!("hello"));
        assert_eq!(descriptor.id, None);
    }

    #[test]
    fn test_scalar_payloads_are_stringified() {
        let number = MessageDescriptor::from_payload(json!(42)).expect("descriptor");
        assert_eq!(number.data, json!("42"));

        let boolean = MessageDescriptor::from_payload(json!(true)).expect("descriptor");
        assert_eq!(boolean.data, json!("true"));
    }

    #[test]
    fn test_whole_float_drops_fraction() {
        let whole = MessageDescriptor::from_payload(json!(1.0)).expect("descriptor");
        assert_eq!(whole.data, json!("1"));

        let negative = MessageDescriptor::from_payload(json!(-20.0)).expect("descriptor");
        assert_eq!(negative.data, json!("-20"));

        let fractional = MessageDescriptor::from_payload(json!(1.5)).expect("descriptor");
        assert_eq!(fractional.data, json!("1.5"));

        let in_array = MessageDescriptor::from_payload(json!([1.0, 2.5])).expect("descriptor");
        assert_eq!(in_array.data, json!("1,2.5"));
    }

    #[test]
    fn test_array_payload_is_joined() {
        let descriptor =
            MessageDescriptor::from_payload(json!([1, "a", null, [2, 3]])).expect("descriptor");
        assert_eq!(descriptor.data, json!("1,a,,2,3"));
    }

    #[test]
    fn test_object_payload_overrides_type() {
        let descriptor = MessageDescriptor::from_payload(json!({
            "type": "customevent",
            "id": "7",
            "data": "test",
        }))
        .expect("descriptor");

        assert_eq!(descriptor.event_type, "customevent");
        assert_eq!(descriptor.id.as_deref(), Some("7"));
        assert_eq!(descriptor.data, json!("test"));
    }

    #[test]
    fn test_object_payload_defaults() {
        let descriptor =
            MessageDescriptor::from_payload(json!({ "data": { "n": 1 } })).expect("descriptor");

        assert_eq!(descriptor.event_type, "message");
        assert_eq!(descriptor.data, json!({ "n": 1 }));
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let descriptor =
            MessageDescriptor::from_payload(json!({ "id": 12, "data": "x" })).expect("descriptor");
        assert_eq!(descriptor.id.as_deref(), Some("12"));
    }

    #[test]
    fn test_null_payload_is_rejected() {
        let err = MessageDescriptor::from_payload(Value::Null).unwrap_err();
        assert!(matches!(err, Error::InvalidMessage { message } if message == "null"));
    }

    #[test]
    fn test_non_string_type_is_rejected() {
        let err = MessageDescriptor::from_payload(json!({ "type": 3 })).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_message_event_fields() {
        let source = target("/stream");
        let descriptor = MessageDescriptor::new("payload").with_id("abc");
        let event = Event::message(descriptor, &source);

        assert_eq!(event.event_type(), "message");
        assert_eq!(event.target(), &source);

        let message = event.as_message().expect("message payload");
        assert_eq!(message.data_str(), Some("payload"));
        assert_eq!(message.last_event_id(), "abc");
        assert_eq!(message.origin(), "http://localhost:9876");
        assert!(message.ports().is_empty());
        assert!(message.source().is_none());
    }

    #[test]
    fn test_message_event_custom_type() {
        let source = target("https://example.com/feed");
        let event = Event::message(MessageDescriptor::new(json!({"k": "v"})).with_type("update"), &source);

        assert_eq!(event.event_type(), "update");
        assert_eq!(event.data(), Some(&json!({"k": "v"})));
        assert_eq!(event.as_message().map(MessageEvent::origin), Some("https://example.com"));
        assert_eq!(event.as_message().map(MessageEvent::last_event_id), Some(""));
    }
}

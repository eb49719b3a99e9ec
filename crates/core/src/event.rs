// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events decoded from message payloads.
//!
//! A payload is valid when it is UTF-8 JSON whose top-level value is an
//! object or an array. Bare scalars are valid JSON but are not events.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Why a payload was not accepted as an event
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message has no payload")]
    EmptyPayload,

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("top-level {kind} not allowed: {value}")]
    Scalar { kind: &'static str, value: String },
}

/// A JSON object or array received from the input topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    /// Decode raw payload bytes into an event
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(payload)?;
        let value: Value = serde_json::from_str(text)?;
        Self::try_from(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        self.0.as_array()
    }

    /// Field of an object event; `None` for arrays
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(key))
    }
}

impl TryFrom<Value> for Event {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let kind = match &value {
            Value::Object(_) | Value::Array(_) => return Ok(Event(value)),
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_f64() => "float",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
        };
        Err(DecodeError::Scalar {
            kind,
            value: value.to_string(),
        })
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        event.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

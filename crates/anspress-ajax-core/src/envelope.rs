//! The response envelope.
//!
//! Every response carries `form_errors`, `success` and `action`. A
//! `snackbar` notice is present whenever one was set or the request failed.
//! Handlers may add any other top-level keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FORM_ERRORS: &str = "form_errors";
pub const SUCCESS: &str = "success";
pub const ACTION: &str = "action";
pub const SNACKBAR: &str = "snackbar";

/// A finished response, ready to serialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Look up any top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn success(&self) -> bool {
        self.get(SUCCESS).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn action(&self) -> Option<&str> {
        self.get(ACTION).and_then(Value::as_str)
    }

    /// Field name to error message.
    pub fn form_errors(&self) -> Option<&Map<String, Value>> {
        self.get(FORM_ERRORS).and_then(Value::as_object)
    }

    pub fn snackbar_message(&self) -> Option<&str> {
        self.get(SNACKBAR)?.get("message")?.as_str()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Envelope> for Value {
    fn from(envelope: Envelope) -> Self {
        envelope.into_value()
    }
}

//! Per-request state handed through the pipeline.

use crate::envelope::{self, Envelope};
use crate::{ActionName, AjaxRequest, Caller, sanitize};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// The mutable state of one request: the inbound parameters, the outcome
/// flag, field errors and the response being assembled.
///
/// The response map is only reachable through the methods below and is
/// turned into an [`Envelope`] when the pipeline transmits.
#[derive(Debug, Clone)]
pub struct ActionContext {
    action: ActionName,
    success: bool,
    request: AjaxRequest,
    form_errors: BTreeMap<String, String>,
    response: Map<String, Value>,
}

impl ActionContext {
    pub fn new(action: ActionName, request: AjaxRequest) -> Self {
        Self {
            action,
            success: false,
            request,
            form_errors: BTreeMap::new(),
            response: Map::new(),
        }
    }

    pub fn action(&self) -> &ActionName {
        &self.action
    }

    pub fn caller(&self) -> &Caller {
        &self.request.caller
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn set_success(&mut self) {
        self.success = true;
    }

    pub fn set_fail(&mut self) {
        self.success = false;
    }

    /// Add or overwrite a response field. Values that fail to serialize are
    /// logged and left out.
    pub fn add_res(&mut self, key: impl Into<String>, value: impl Serialize) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.response.insert(key, value);
            }
            Err(e) => tracing::warn!(action = %self.action, %key, "dropping response field: {}", e),
        }
    }

    pub fn response_field(&self, key: &str) -> Option<&Value> {
        self.response.get(key)
    }

    /// Set the notice shown to the user, replacing any earlier one.
    pub fn snackbar(&mut self, message: impl Into<String>) {
        self.response
            .insert(envelope::SNACKBAR.to_string(), json!({ "message": message.into() }));
    }

    /// Whether a notice is set. Null, `false`, zero, `""`, `{}` and `[]`
    /// count as no notice.
    pub fn has_snackbar(&self) -> bool {
        self.response
            .get(envelope::SNACKBAR)
            .is_some_and(|v| !is_blank(v))
    }

    /// Record a validation error for a form field. Does not change the
    /// outcome flag.
    pub fn set_field_error(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.form_errors.insert(name.into(), message.into());
    }

    pub fn has_form_errors(&self) -> bool {
        !self.form_errors.is_empty()
    }

    pub fn form_errors(&self) -> &BTreeMap<String, String> {
        &self.form_errors
    }

    /// Read a request value. A missing key is `None`.
    pub fn req(&self, key: &str) -> Option<&Value> {
        self.request.params.get(key)
    }

    /// Write a request value, e.g. a normalized form of an input.
    pub fn set_req(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.request.params.insert(key.into(), value.into());
    }

    pub fn req_str(&self, key: &str) -> Option<&str> {
        self.req(key).and_then(Value::as_str)
    }

    /// Read a request value as an unsigned integer, accepting numeric strings.
    pub fn req_u64(&self, key: &str) -> Option<u64> {
        match self.req(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read a request value unslashed and sanitized as single-line text.
    /// Missing or non-scalar values read as an empty string.
    pub fn sanitized_req(&self, key: &str) -> String {
        let raw = match self.req(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return String::new(),
        };
        sanitize::text_field(&sanitize::unslash(&raw))
    }

    /// Write the fields every response must carry. These overwrite any
    /// same-named fields added by the handler.
    pub(crate) fn write_status_fields(&mut self) {
        let errors = self
            .form_errors
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.response
            .insert(envelope::FORM_ERRORS.to_string(), Value::Object(errors));
        self.response
            .insert(envelope::SUCCESS.to_string(), Value::Bool(self.success));
        self.response.insert(
            envelope::ACTION.to_string(),
            Value::String(self.action.to_string()),
        );
    }

    pub(crate) fn into_envelope(self) -> Envelope {
        Envelope::from_map(self.response)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

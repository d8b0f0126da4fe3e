//! Inbound request data.

use crate::Caller;
use serde_json::{Map, Value};

/// Parameter naming the action a request wants to run.
pub const ACTION_PARAM: &str = "action";

/// Everything the pipeline knows about one inbound request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AjaxRequest {
    /// Who sent it.
    pub caller: Caller,
    /// Request key/value pairs (query and body merged).
    pub params: Map<String, Value>,
}

impl AjaxRequest {
    pub fn new(caller: Caller) -> Self {
        Self {
            caller,
            params: Map::new(),
        }
    }

    /// Build a request from string pairs, as decoded from a query or form.
    /// Later pairs overwrite earlier ones with the same key.
    pub fn from_pairs<I, K, V>(caller: Caller, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { caller, params }
    }

    /// Builder-style parameter insert.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The requested action name, if any.
    pub fn action(&self) -> Option<&str> {
        self.params.get(ACTION_PARAM).and_then(Value::as_str)
    }
}

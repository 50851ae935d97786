use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The key and attributes an AI config is evaluated against.
///
/// Built per request and never persisted. `key` is never empty; callers
/// that have no user id get a session-derived key from the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Render as a single-kind evaluation context:
    /// `{"kind": "user", "key": ..., <attributes>...}`.
    ///
    /// Attributes named `kind` or `key` are skipped so they cannot shadow
    /// the built-in fields.
    pub fn to_context_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("kind".into(), "user".into());
        obj.insert("key".into(), self.key.clone().into());
        for (name, value) in &self.attributes {
            if name == "kind" || name == "key" {
                continue;
            }
            obj.insert(name.clone(), value.clone().into());
        }
        serde_json::Value::Object(obj)
    }
}

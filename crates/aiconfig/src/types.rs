//! Typed AI config bundle.
//!
//! The service hands back an untyped JSON flag value. It is decoded here,
//! once, at the boundary: anything that does not fit the expected shape is
//! rejected and the caller falls back to its default.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cc_domain::error::{Error, Result};
use cc_domain::message::Role;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Bundle types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One evaluated AI config.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AiConfig {
    pub enabled: bool,
    pub model: Option<ModelConfig>,
    /// Prompt templates in order. Any `{{ldctx.*}}` placeholders have
    /// already been resolved by the service.
    pub messages: Vec<ConfigMessage>,
    pub variation_key: Option<String>,
    pub version: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default)]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMessage {
    pub role: Role,
    pub content: String,
}

impl ConfigMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

impl AiConfig {
    /// A disabled bundle with no model and no templates; the usual fallback.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// An enabled bundle for `model` with the given templates.
    pub fn enabled(model: impl Into<String>, messages: Vec<ConfigMessage>) -> Self {
        Self {
            enabled: true,
            model: Some(ModelConfig {
                name: model.into(),
                parameters: None,
            }),
            messages,
            variation_key: None,
            version: None,
        }
    }

    /// Same bundle with `enabled` forced off.
    pub fn into_disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.name.as_str())
    }

    /// Decode a flag value returned by the evaluation endpoint.
    ///
    /// `flag_version` is the flag's own version, used when the value's
    /// metadata does not carry one.
    pub fn from_flag_value(value: &Value, flag_version: Option<u64>) -> Result<Self> {
        let wire: FlagValueWire = serde_json::from_value(value.clone())
            .map_err(|e| Error::AiConfig(format!("unexpected AI config shape: {e}")))?;

        let meta = wire.meta.unwrap_or_default();
        let model = wire.model.filter(|m| !m.name.trim().is_empty());

        if meta.enabled && model.is_none() {
            return Err(Error::AiConfig(
                "AI config is enabled but names no model".into(),
            ));
        }

        Ok(Self {
            enabled: meta.enabled,
            model,
            messages: wire.messages,
            variation_key: meta.variation_key,
            version: meta.version.or(flag_version),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct FlagValueWire {
    #[serde(rename = "_ldMeta", default)]
    meta: Option<MetaWire>,
    #[serde(default)]
    model: Option<ModelConfig>,
    #[serde(default)]
    messages: Vec<ConfigMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaWire {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    variation_key: Option<String>,
    #[serde(default)]
    version: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_enabled_config() {
        let value = json!({
            "_ldMeta": { "enabled": true, "variationKey": "haiku", "version": 3 },
            "model": { "name": "anthropic.claude-3-haiku", "parameters": { "temperature": 0.5 } },
            "messages": [
                { "role": "system", "content": "You are helpful to jane@example.com." }
            ]
        });
        let cfg = AiConfig::from_flag_value(&value, Some(40)).unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.model_name(), Some("anthropic.claude-3-haiku"));
        assert_eq!(cfg.variation_key.as_deref(), Some("haiku"));
        assert_eq!(cfg.version, Some(3));
        assert_eq!(cfg.messages[0].role, Role::System);
        assert_eq!(
            cfg.model.unwrap().parameters,
            Some(json!({ "temperature": 0.5 }))
        );
    }

    #[test]
    fn flag_version_used_when_meta_has_none() {
        let value = json!({ "_ldMeta": { "enabled": false } });
        let cfg = AiConfig::from_flag_value(&value, Some(7)).unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.version, Some(7));
    }

    #[test]
    fn missing_meta_means_disabled() {
        let value = json!({ "model": { "name": "m1" } });
        let cfg = AiConfig::from_flag_value(&value, None).unwrap();
        assert!(!cfg.enabled);
    }

    #[test]
    fn enabled_without_model_is_rejected() {
        let value = json!({ "_ldMeta": { "enabled": true }, "messages": [] });
        assert!(AiConfig::from_flag_value(&value, None).is_err());

        let blank = json!({ "_ldMeta": { "enabled": true }, "model": { "name": "  " } });
        assert!(AiConfig::from_flag_value(&blank, None).is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let value = json!({
            "_ldMeta": { "enabled": true },
            "model": { "name": "m1" },
            "messages": [{ "role": "tool", "content": "x" }]
        });
        assert!(AiConfig::from_flag_value(&value, None).is_err());
    }

    #[test]
    fn non_object_value_is_rejected() {
        assert!(AiConfig::from_flag_value(&json!(true), None).is_err());
    }

    #[test]
    fn into_disabled_keeps_contents() {
        let cfg = AiConfig::enabled("m1", vec![ConfigMessage::new(Role::System, "x")]).into_disabled();
        assert!(!cfg.enabled);
        assert_eq!(cfg.model_name(), Some("m1"));
        assert_eq!(cfg.messages.len(), 1);
    }
}

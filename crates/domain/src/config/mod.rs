mod aiconfig;
mod bedrock;
mod observability;
mod server;
mod sessions;

pub use aiconfig::*;
pub use bedrock::*;
pub use observability::*;
pub use server::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub aiconfig: AiConfigSettings,
    #[serde(default)]
    pub bedrock: BedrockConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Config {
    /// Apply the deployment environment variables on top of the parsed file:
    /// `PORT`, `AWS_REGION`, `LAUNCHDARKLY_AI_CONFIG_KEY`,
    /// `LAUNCHDARKLY_JUDGE_CONFIG_KEY` (an empty judge key disables the judge),
    /// `OTEL_EXPORTER_OTLP_ENDPOINT` and `OTEL_SERVICE_NAME`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid PORT"),
            }
        }
        if let Some(region) = lookup("AWS_REGION").filter(|r| !r.trim().is_empty()) {
            self.bedrock.region = region.trim().to_owned();
        }
        if let Some(key) = lookup("LAUNCHDARKLY_AI_CONFIG_KEY").filter(|k| !k.trim().is_empty()) {
            self.aiconfig.chat_config_key = key.trim().to_owned();
        }
        if let Some(key) = lookup("LAUNCHDARKLY_JUDGE_CONFIG_KEY") {
            let key = key.trim();
            self.aiconfig.judge_config_key = if key.is_empty() {
                None
            } else {
                Some(key.to_owned())
            };
        }
        if let Some(endpoint) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.observability.otlp_endpoint = Some(endpoint.trim().to_owned());
        }
        if let Some(name) = lookup("OTEL_SERVICE_NAME").filter(|n| !n.trim().is_empty()) {
            self.observability.service_name = name.trim().to_owned();
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.aiconfig.chat_config_key.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "aiconfig.chat_config_key".into(),
                message: "chat AI config key must not be empty".into(),
            });
        }

        if self.aiconfig.base_url.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "aiconfig.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        }

        if self.aiconfig.judge_config_key.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "aiconfig.judge_config_key".into(),
                message: "no judge AI config key; responses will not be evaluated".into(),
            });
        }

        if self.bedrock.region.trim().is_empty() && self.bedrock.endpoint.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "bedrock.region".into(),
                message: "region must be set when no endpoint override is given".into(),
            });
        }

        if self.sessions.max_history_turns == 1 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.max_history_turns".into(),
                message: "max_history_turns must be 0 (unbounded) or at least 2 to keep one exchange".into(),
            });
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "observability.sample_rate".into(),
                message: "sample_rate must be between 0.0 and 1.0".into(),
            });
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let issues = Config::default().validate();
        assert!(issues.iter().all(|i| i.severity != ConfigSeverity::Error));
    }

    #[test]
    fn otel_env_overrides_observability() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(lookup(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
            ("OTEL_SERVICE_NAME", "configchat-staging"),
        ]));
        assert_eq!(cfg.observability.export_endpoint(), Some("http://collector:4317"));
        assert_eq!(cfg.observability.service_name, "configchat-staging");

        cfg.apply_overrides_from(lookup(&[("OTEL_EXPORTER_OTLP_ENDPOINT", "")]));
        assert_eq!(cfg.observability.export_endpoint(), None);
    }

    #[test]
    fn single_turn_history_bound_is_rejected() {
        let mut cfg = Config::default();
        cfg.sessions.max_history_turns = 1;
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.field == "sessions.max_history_turns"
            && i.severity == ConfigSeverity::Error));

        cfg.sessions.max_history_turns = 2;
        assert!(cfg
            .validate()
            .iter()
            .all(|i| i.field != "sessions.max_history_turns"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(lookup(&[
            ("PORT", "8080"),
            ("AWS_REGION", "eu-west-1"),
            ("LAUNCHDARKLY_AI_CONFIG_KEY", "my-chat"),
            ("LAUNCHDARKLY_JUDGE_CONFIG_KEY", "my-judge"),
        ]));
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.bedrock.region, "eu-west-1");
        assert_eq!(cfg.aiconfig.chat_config_key, "my-chat");
        assert_eq!(cfg.aiconfig.judge_config_key.as_deref(), Some("my-judge"));
    }

    #[test]
    fn empty_judge_key_disables_judge() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(lookup(&[("LAUNCHDARKLY_JUDGE_CONFIG_KEY", "")]));
        assert!(cfg.aiconfig.judge_config_key.is_none());
    }

    #[test]
    fn invalid_port_is_ignored() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(lookup(&[("PORT", "not-a-port")]));
        assert_eq!(cfg.server.port, 5000);
    }

    #[test]
    fn empty_chat_key_is_an_error() {
        let mut cfg = Config::default();
        cfg.aiconfig.chat_config_key = "  ".into();
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "aiconfig.chat_config_key" && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn sample_rate_out_of_range_is_an_error() {
        let mut cfg = Config::default();
        cfg.observability.sample_rate = 1.5;
        assert!(cfg
            .validate()
            .iter()
            .any(|i| i.field == "observability.sample_rate"));
    }
}

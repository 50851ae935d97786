use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AI config service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection settings for the remote AI configuration service.
///
/// Evaluation goes through a Relay-Proxy-compatible `evalx` endpoint and
/// usage metrics are posted as custom events to `{events_url}/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfigSettings {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Events endpoint. Defaults to `base_url` when unset.
    #[serde(default)]
    pub events_url: Option<String>,
    /// Environment variable holding the SDK key.
    #[serde(default = "d_sdk_key_env")]
    pub sdk_key_env: String,
    /// AI config evaluated for every chat message.
    #[serde(default = "d_chat_config_key")]
    pub chat_config_key: String,
    /// AI config used to score responses. `None` disables the judge.
    #[serde(default = "d_judge_config_key")]
    pub judge_config_key: Option<String>,
    /// Custom metric key the judge's score is recorded under.
    #[serde(default = "d_accuracy_metric")]
    pub accuracy_metric: String,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfigSettings {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            events_url: None,
            sdk_key_env: d_sdk_key_env(),
            chat_config_key: d_chat_config_key(),
            judge_config_key: d_judge_config_key(),
            accuracy_metric: d_accuracy_metric(),
            timeout_secs: d_timeout_secs(),
        }
    }
}

impl AiConfigSettings {
    pub fn effective_events_url(&self) -> &str {
        self.events_url.as_deref().unwrap_or(&self.base_url)
    }
}

fn d_base_url() -> String {
    "http://localhost:8030".into()
}
fn d_sdk_key_env() -> String {
    "LAUNCHDARKLY_SDK_KEY".into()
}
fn d_chat_config_key() -> String {
    "chat-assistant-config".into()
}
fn d_judge_config_key() -> Option<String> {
    Some("ld-ai-judge-accuracy".into())
}
fn d_accuracy_metric() -> String {
    "ai-accuracy".into()
}
fn d_timeout_secs() -> u64 {
    10
}

//! In-process stand-ins for the AI config service and the model endpoint.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use cc_aiconfig::testing::RecordingSink;
use cc_aiconfig::{AiConfig, AiConfigSource, ConfigMessage, FetchedConfig};
use cc_domain::config::Config;
use cc_domain::error::{Error, Result};
use cc_domain::identity::Identity;
use cc_domain::message::Role;
use cc_domain::usage::Usage;
use cc_gateway::state::AppState;
use cc_providers::{ConverseRequest, ConverseResponse, InferenceClient};

pub const CHAT_KEY: &str = "chat-assistant-config";
pub const JUDGE_KEY: &str = "ld-ai-judge-accuracy";
pub const CHAT_MODEL: &str = "anthropic.claude-3-haiku";
pub const JUDGE_MODEL: &str = "anthropic.claude-3-sonnet";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AI config source
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Serves fixed configs per key. Unknown keys return the fallback,
/// disabled. Every key gets its own recording sink.
#[derive(Default)]
pub struct StaticConfigs {
    configs: Mutex<HashMap<String, AiConfig>>,
    sinks: Mutex<HashMap<String, Arc<RecordingSink>>>,
    lookups: Mutex<Vec<(String, Identity)>>,
}

impl StaticConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, config: AiConfig) -> Self {
        self.configs.lock().insert(key.to_owned(), config);
        self
    }

    pub fn set(&self, key: &str, config: AiConfig) {
        self.configs.lock().insert(key.to_owned(), config);
    }

    pub fn sink(&self, key: &str) -> Arc<RecordingSink> {
        self.sinks
            .lock()
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(RecordingSink::new()))
            .clone()
    }

    pub fn lookups(&self) -> Vec<(String, Identity)> {
        self.lookups.lock().clone()
    }
}

#[async_trait::async_trait]
impl AiConfigSource for StaticConfigs {
    async fn config(&self, key: &str, identity: &Identity, fallback: AiConfig) -> FetchedConfig {
        self.lookups.lock().push((key.to_owned(), identity.clone()));
        let config = self.configs.lock().get(key).cloned();
        match config {
            Some(config) if config.enabled => FetchedConfig {
                config,
                tracker: self.sink(key),
            },
            Some(_) => FetchedConfig {
                config: fallback.into_disabled(),
                tracker: self.sink(key),
            },
            None => FetchedConfig::unavailable(fallback),
        }
    }
}

pub fn chat_config() -> AiConfig {
    AiConfig::enabled(
        CHAT_MODEL,
        vec![ConfigMessage::new(Role::System, "You are a helpful assistant.")],
    )
}

pub fn judge_config() -> AiConfig {
    AiConfig::enabled(
        JUDGE_MODEL,
        vec![ConfigMessage::new(
            Role::System,
            "Rate the accuracy of the output. Reply with 'Score: <0..1>'.",
        )],
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Replies per model id from a queue; an empty queue answers `"ok"`.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<HashMap<String, VecDeque<std::result::Result<String, String>>>>,
    requests: Mutex<Vec<ConverseRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, model: &str, text: &str) {
        self.push(model, Ok(text.to_owned()));
    }

    pub fn fail(&self, model: &str, message: &str) {
        self.push(model, Err(message.to_owned()));
    }

    fn push(&self, model: &str, reply: std::result::Result<String, String>) {
        self.replies
            .lock()
            .entry(model.to_owned())
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<ConverseRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_for(&self, model: &str) -> Vec<ConverseRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.model_id == model)
            .collect()
    }
}

#[async_trait::async_trait]
impl InferenceClient for ScriptedModel {
    async fn converse(&self, req: ConverseRequest) -> Result<ConverseResponse> {
        let reply = self
            .replies
            .lock()
            .get_mut(&req.model_id)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Ok("ok".to_owned()));
        self.requests.lock().push(req);

        match reply {
            Ok(text) => Ok(ConverseResponse {
                text,
                usage: Usage::new(20, 10),
                stop_reason: Some("end_turn".into()),
            }),
            Err(message) => Err(Error::Provider {
                provider: "scripted".into(),
                message,
            }),
        }
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// State
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Harness {
    pub state: AppState,
    pub configs: Arc<StaticConfigs>,
    pub model: Arc<ScriptedModel>,
}

/// Chat config enabled; judge enabled only when `with_judge`.
pub fn harness(with_judge: bool) -> Harness {
    let mut configs = StaticConfigs::new().with(CHAT_KEY, chat_config());
    if with_judge {
        configs = configs.with(JUDGE_KEY, judge_config());
    }
    harness_with(Config::default(), configs)
}

pub fn harness_with(config: Config, configs: StaticConfigs) -> Harness {
    let configs = Arc::new(configs);
    let model = Arc::new(ScriptedModel::new());
    let state = AppState::new(Arc::new(config), configs.clone(), model.clone());
    Harness {
        state,
        configs,
        model,
    }
}

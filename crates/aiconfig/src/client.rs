//! AI config evaluation.
//!
//! [`LaunchDarklyClient`] evaluates flags with one
//! `REPORT {base_url}/sdk/evalx/context` call per lookup (the Relay Proxy's
//! server-side evaluation route). The body is the evaluation context; the
//! reply maps every flag key to `{value, variation, version}`.
//!
//! Fetching never fails from the caller's point of view: any problem is
//! logged and the caller's fallback comes back with `enabled = false`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;

use cc_domain::config::AiConfigSettings;
use cc_domain::error::{Error, Result};
use cc_domain::identity::Identity;
use cc_domain::trace::TraceEvent;

use crate::tracker::{AiConfigTracker, EventsClient, MetricsSink, NoopTracker};
use crate::types::AiConfig;
use crate::util::{from_reqwest, secret_from_env};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Source trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An evaluated config plus the metrics sink bound to it.
#[derive(Clone)]
pub struct FetchedConfig {
    pub config: AiConfig,
    pub tracker: Arc<dyn MetricsSink>,
}

impl FetchedConfig {
    /// The fallback path: `fallback` forced to disabled, metrics discarded.
    pub fn unavailable(fallback: AiConfig) -> Self {
        Self {
            config: fallback.into_disabled(),
            tracker: Arc::new(NoopTracker),
        }
    }
}

impl std::fmt::Debug for FetchedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedConfig")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Anything that can evaluate an AI config for an identity.
#[async_trait::async_trait]
pub trait AiConfigSource: Send + Sync {
    /// Evaluate `key` for `identity`. Never fails: when the config cannot
    /// be obtained, `fallback` is returned disabled with a no-op sink.
    async fn config(&self, key: &str, identity: &Identity, fallback: AiConfig) -> FetchedConfig;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct FlagEvalWire {
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    version: Option<u64>,
}

/// AI config client speaking the Relay Proxy evaluation and events API.
pub struct LaunchDarklyClient {
    eval_url: String,
    sdk_key: Option<String>,
    client: reqwest::Client,
    events: Arc<EventsClient>,
}

impl LaunchDarklyClient {
    pub fn from_settings(settings: &AiConfigSettings) -> Result<Self> {
        let sdk_key = secret_from_env(&settings.sdk_key_env);
        if sdk_key.is_none() {
            tracing::warn!(
                env_var = %settings.sdk_key_env,
                "no AI config SDK key found, evaluation requests will be unauthenticated"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            eval_url: format!(
                "{}/sdk/evalx/context",
                settings.base_url.trim_end_matches('/')
            ),
            sdk_key,
            client,
            events: Arc::new(EventsClient::from_settings(settings)?),
        })
    }

    /// Evaluate every flag for `identity` and pick out `key`.
    async fn evaluate(&self, key: &str, identity: &Identity) -> Result<FlagEvalWire> {
        let method = reqwest::Method::from_bytes(b"REPORT")
            .map_err(|e| Error::Other(format!("REPORT method: {e}")))?;

        let mut builder = self
            .client
            .request(method, &self.eval_url)
            .header("Content-Type", "application/json")
            .json(&identity.to_context_json());
        if let Some(sdk_key) = &self.sdk_key {
            builder = builder.header("Authorization", sdk_key);
        }

        let resp = builder.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let body = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::AiConfig(format!(
                "evaluation returned HTTP {} - {}",
                status.as_u16(),
                body
            )));
        }

        select_flag(&body, key)
    }
}

/// Pick `key` out of an evaluation reply (flag key to evaluation).
fn select_flag(body: &str, key: &str) -> Result<FlagEvalWire> {
    let mut flags: HashMap<String, FlagEvalWire> = serde_json::from_str(body)?;
    flags
        .remove(key)
        .ok_or_else(|| Error::AiConfig(format!("AI config '{key}' not found")))
}

#[async_trait::async_trait]
impl AiConfigSource for LaunchDarklyClient {
    async fn config(&self, key: &str, identity: &Identity, fallback: AiConfig) -> FetchedConfig {
        let started = Instant::now();

        let decoded = match self.evaluate(key, identity).await {
            Ok(flag) => AiConfig::from_flag_value(&flag.value, flag.version),
            Err(e) => Err(e),
        };

        let fetched = match decoded {
            Ok(config) if config.enabled => {
                let tracker = AiConfigTracker::new(
                    self.events.clone(),
                    key,
                    identity.key.clone(),
                    config.variation_key.clone(),
                    config.version,
                );
                FetchedConfig {
                    config,
                    tracker: Arc::new(tracker),
                }
            }
            Ok(config) => {
                tracing::info!(config_key = %key, "AI config is disabled for this context");
                let tracker = AiConfigTracker::new(
                    self.events.clone(),
                    key,
                    identity.key.clone(),
                    config.variation_key.clone(),
                    config.version,
                );
                FetchedConfig {
                    config: fallback.into_disabled(),
                    tracker: Arc::new(tracker),
                }
            }
            Err(e) => {
                tracing::warn!(config_key = %key, error = %e, "AI config unavailable, using fallback");
                FetchedConfig::unavailable(fallback)
            }
        };

        TraceEvent::AiConfigFetched {
            config_key: key.to_owned(),
            context_key: identity.key.clone(),
            enabled: fetched.config.enabled,
            model: fetched.config.model_name().map(str::to_owned),
            variation_key: fetched.config.variation_key.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        fetched
    }
}

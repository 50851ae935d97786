//! Metrics sinks bound to one evaluated AI config.
//!
//! Every sink call is best-effort: implementations log delivery failures
//! and return normally, so metrics can never mask an exchange's result.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use cc_domain::config::AiConfigSettings;
use cc_domain::error::{Error, Result};
use cc_domain::usage::Usage;

use crate::util::{from_reqwest, secret_from_env};

/// Custom event keys understood by the AI config metrics views.
pub mod keys {
    pub const DURATION_TOTAL: &str = "$ld:ai:duration:total";
    pub const TOKENS_TOTAL: &str = "$ld:ai:tokens:total";
    pub const TOKENS_INPUT: &str = "$ld:ai:tokens:input";
    pub const TOKENS_OUTPUT: &str = "$ld:ai:tokens:output";
    pub const GENERATION_SUCCESS: &str = "$ld:ai:generation:success";
    pub const GENERATION_ERROR: &str = "$ld:ai:generation:error";
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sink trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Receiver for usage and outcome metrics of one AI config evaluation.
#[async_trait::async_trait]
pub trait MetricsSink: Send + Sync {
    /// A generation finished: its wall-clock duration and token usage.
    async fn track_success(&self, usage: Usage, duration_ms: u64);

    /// A generation failed after `duration_ms`. `marker` names the failure.
    async fn track_failure(&self, duration_ms: u64, marker: &str);

    /// An arbitrary numeric metric (e.g. a judge score).
    async fn track_metric(&self, name: &str, value: f64);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// No-op sink
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sink handed out with fallback configs: discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

#[async_trait::async_trait]
impl MetricsSink for NoopTracker {
    async fn track_success(&self, _usage: Usage, _duration_ms: u64) {}
    async fn track_failure(&self, _duration_ms: u64, _marker: &str) {}
    async fn track_metric(&self, _name: &str, _value: f64) {}
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Events client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Posts custom analytics events to `{events_url}/bulk`.
pub struct EventsClient {
    bulk_url: String,
    sdk_key: Option<String>,
    client: reqwest::Client,
}

impl EventsClient {
    pub fn from_settings(settings: &AiConfigSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            bulk_url: format!(
                "{}/bulk",
                settings.effective_events_url().trim_end_matches('/')
            ),
            sdk_key: secret_from_env(&settings.sdk_key_env),
            client,
        })
    }

    pub async fn send(&self, events: &[Value]) -> Result<()> {
        let mut builder = self
            .client
            .post(&self.bulk_url)
            .header("Content-Type", "application/json")
            .header("X-LaunchDarkly-Event-Schema", "4");
        if let Some(key) = &self.sdk_key {
            builder = builder.header("Authorization", key);
        }

        let resp = builder.json(events).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::AiConfig(format!(
                "events endpoint returned HTTP {} - {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AI config tracker
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sink bound to one evaluation: every event carries the config key,
/// variation and version it was produced under.
pub struct AiConfigTracker {
    events: Arc<EventsClient>,
    config_key: String,
    context_key: String,
    variation_key: Option<String>,
    version: Option<u64>,
}

impl AiConfigTracker {
    pub fn new(
        events: Arc<EventsClient>,
        config_key: impl Into<String>,
        context_key: impl Into<String>,
        variation_key: Option<String>,
        version: Option<u64>,
    ) -> Self {
        Self {
            events,
            config_key: config_key.into(),
            context_key: context_key.into(),
            variation_key,
            version,
        }
    }

    fn event(&self, key: &str, metric_value: Option<f64>) -> Value {
        let mut event = serde_json::json!({
            "kind": "custom",
            "creationDate": chrono::Utc::now().timestamp_millis(),
            "key": key,
            "contextKeys": { "user": self.context_key },
            "data": {
                "configKey": self.config_key,
                "variationKey": self.variation_key,
                "version": self.version,
            },
        });
        if let Some(value) = metric_value {
            event["metricValue"] = serde_json::json!(value);
        }
        event
    }

    async fn deliver(&self, events: Vec<Value>) {
        if let Err(e) = self.events.send(&events).await {
            tracing::warn!(
                config_key = %self.config_key,
                events = events.len(),
                error = %e,
                "dropping AI config metrics"
            );
        }
    }
}

#[async_trait::async_trait]
impl MetricsSink for AiConfigTracker {
    async fn track_success(&self, usage: Usage, duration_ms: u64) {
        let mut events = vec![self.event(keys::DURATION_TOTAL, Some(duration_ms as f64))];
        if usage.total() > 0 {
            events.push(self.event(keys::TOKENS_TOTAL, Some(usage.total() as f64)));
            events.push(self.event(keys::TOKENS_INPUT, Some(usage.input_tokens as f64)));
            events.push(self.event(keys::TOKENS_OUTPUT, Some(usage.output_tokens as f64)));
        }
        events.push(self.event(keys::GENERATION_SUCCESS, Some(1.0)));
        self.deliver(events).await;
    }

    async fn track_failure(&self, duration_ms: u64, marker: &str) {
        let mut error = self.event(keys::GENERATION_ERROR, Some(1.0));
        error["data"]["error"] = serde_json::json!(marker);
        let events = vec![
            self.event(keys::DURATION_TOTAL, Some(duration_ms as f64)),
            error,
        ];
        self.deliver(events).await;
    }

    async fn track_metric(&self, name: &str, value: f64) {
        let events = vec![self.event(name, Some(value))];
        self.deliver(events).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> AiConfigTracker {
        let settings = AiConfigSettings {
            // Port 9 (discard) on localhost: nothing listens, sends fail fast.
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 1,
            ..AiConfigSettings::default()
        };
        AiConfigTracker::new(
            Arc::new(EventsClient::from_settings(&settings).unwrap()),
            "chat-assistant-config",
            "user-s1",
            Some("v1".into()),
            Some(4),
        )
    }

    #[test]
    fn event_carries_config_metadata() {
        let event = tracker().event(keys::DURATION_TOTAL, Some(120.0));
        assert_eq!(event["kind"], "custom");
        assert_eq!(event["key"], keys::DURATION_TOTAL);
        assert_eq!(event["contextKeys"]["user"], "user-s1");
        assert_eq!(event["data"]["configKey"], "chat-assistant-config");
        assert_eq!(event["data"]["variationKey"], "v1");
        assert_eq!(event["data"]["version"], 4);
        assert_eq!(event["metricValue"], 120.0);
    }

    #[test]
    fn event_without_value_has_no_metric_field() {
        let event = tracker().event("plain", None);
        assert!(event.get("metricValue").is_none());
    }

    #[tokio::test]
    async fn delivery_failures_are_swallowed() {
        let t = tracker();
        t.track_success(Usage::new(1, 2), 10).await;
        t.track_failure(10, "provider_error").await;
        t.track_metric("ai-accuracy", 0.5).await;
    }
}

//! AWS Bedrock Converse adapter.
//!
//! Talks to `POST {endpoint}/model/{modelId}/converse` with a Bedrock API
//! key sent as a bearer token. The key is read once at construction from
//! the env var named by `[bedrock] token_env`. Without a key the requests
//! still go out unauthenticated, which only works against endpoints that
//! authenticate some other way (VPC endpoint policies, local stubs).

use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::traits::{ConverseRequest, ConverseResponse, InferenceClient};
use crate::util::{from_reqwest, secret_from_env};
use cc_domain::config::BedrockConfig;
use cc_domain::error::{Error, Result};
use cc_domain::message::Message;
use cc_domain::trace::TraceEvent;
use cc_domain::usage::Usage;

const PROVIDER_ID: &str = "bedrock";

/// Parameter keys that belong in Converse's `inferenceConfig`, with the
/// snake_case spellings AI configs commonly use.
const INFERENCE_KEYS: &[(&str, &str)] = &[
    ("maxTokens", "maxTokens"),
    ("max_tokens", "maxTokens"),
    ("temperature", "temperature"),
    ("topP", "topP"),
    ("top_p", "topP"),
    ("stopSequences", "stopSequences"),
    ("stop_sequences", "stopSequences"),
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Inference client for the Bedrock runtime Converse API.
pub struct BedrockProvider {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl BedrockProvider {
    /// Create the provider from config.
    pub fn from_config(cfg: &BedrockConfig) -> Result<Self> {
        let token = secret_from_env(&cfg.token_env);
        if token.is_none() {
            tracing::warn!(
                env_var = %cfg.token_env,
                "no Bedrock API key found, requests will be sent unauthenticated"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        let endpoint = cfg.effective_endpoint();
        tracing::info!(endpoint = %endpoint, region = %cfg.region, "bedrock provider ready");

        Ok(Self {
            endpoint,
            token,
            client,
        })
    }

    // ── Internal: URL + authenticated request builder ──────────────

    fn converse_url(&self, model_id: &str) -> Result<reqwest::Url> {
        converse_url(&self.endpoint, model_id)
    }

    fn authed_post(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build `{endpoint}/model/{modelId}/converse`. The model id is pushed as a
/// single path segment so ARNs with `/` are escaped.
fn converse_url(endpoint: &str, model_id: &str) -> Result<reqwest::Url> {
    if model_id.trim().is_empty() {
        return Err(Error::Provider {
            provider: PROVIDER_ID.into(),
            message: "model id must not be empty".into(),
        });
    }
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| Error::Config(format!("invalid bedrock endpoint {endpoint}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("bedrock endpoint {endpoint} cannot take a path")))?
        .pop_if_empty()
        .extend(["model", model_id, "converse"]);
    Ok(url)
}

fn msg_to_bedrock(msg: &Message) -> Value {
    serde_json::json!({
        "role": msg.role.as_str(),
        "content": [{ "text": msg.content }],
    })
}

/// Split AI config parameters into Converse's `inferenceConfig` and
/// `additionalModelRequestFields`.
fn split_parameters(parameters: Option<&Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut inference = Map::new();
    let mut additional = Map::new();

    let Some(Value::Object(params)) = parameters else {
        return (inference, additional);
    };

    for (key, value) in params {
        if key == "inferenceConfig" {
            if let Value::Object(nested) = value {
                inference.extend(nested.clone());
            }
            continue;
        }
        match INFERENCE_KEYS.iter().find(|(from, _)| from == key) {
            Some((_, to)) => {
                inference.insert((*to).to_owned(), value.clone());
            }
            None => {
                additional.insert(key.clone(), value.clone());
            }
        }
    }

    (inference, additional)
}

fn build_converse_body(req: &ConverseRequest) -> Value {
    let messages: Vec<Value> = req.messages.iter().map(msg_to_bedrock).collect();
    let mut body = serde_json::json!({ "messages": messages });

    if !req.system.is_empty() {
        let system: Vec<Value> = req
            .system
            .iter()
            .map(|text| serde_json::json!({ "text": text }))
            .collect();
        body["system"] = Value::Array(system);
    }

    let (inference, additional) = split_parameters(req.parameters.as_ref());
    if !inference.is_empty() {
        body["inferenceConfig"] = Value::Object(inference);
    }
    if !additional.is_empty() {
        body["additionalModelRequestFields"] = Value::Object(additional);
    }
    body
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseWire {
    output: OutputWire,
    #[serde(default)]
    usage: Option<UsageWire>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputWire {
    #[serde(default)]
    message: Option<MessageWire>,
}

#[derive(Debug, Deserialize)]
struct MessageWire {
    #[serde(default)]
    content: Vec<ContentBlockWire>,
}

#[derive(Debug, Deserialize)]
struct ContentBlockWire {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageWire {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorWire {
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

fn parse_converse_response(raw: &str) -> Result<ConverseResponse> {
    let wire: ConverseWire = serde_json::from_str(raw)?;

    let text = wire
        .output
        .message
        .into_iter()
        .flat_map(|m| m.content)
        .find_map(|block| block.text)
        .unwrap_or_default();

    let usage = wire
        .usage
        .map(|u| Usage::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    Ok(ConverseResponse {
        text,
        usage,
        stop_reason: wire.stop_reason,
    })
}

fn error_message(status: reqwest::StatusCode, raw: &str) -> String {
    let detail = serde_json::from_str::<ErrorWire>(raw)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| raw.to_owned());
    format!("HTTP {} - {}", status.as_u16(), detail)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl InferenceClient for BedrockProvider {
    async fn converse(&self, req: ConverseRequest) -> Result<ConverseResponse> {
        let url = self.converse_url(&req.model_id)?;
        let body = build_converse_body(&req);

        tracing::debug!(
            provider = PROVIDER_ID,
            model = %req.model_id,
            messages = req.messages.len(),
            "bedrock converse request"
        );

        let started = Instant::now();
        let result = async {
            let resp = self
                .authed_post(url)
                .json(&body)
                .send()
                .await
                .map_err(from_reqwest)?;

            let status = resp.status();
            let resp_text = resp.text().await.map_err(from_reqwest)?;

            if !status.is_success() {
                return Err(Error::Provider {
                    provider: PROVIDER_ID.into(),
                    message: error_message(status, &resp_text),
                });
            }

            parse_converse_response(&resp_text)
        }
        .await;

        TraceEvent::LlmRequest {
            provider: PROVIDER_ID.into(),
            model: req.model_id.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            input_tokens: result.as_ref().ok().map(|r| r.usage.input_tokens),
            output_tokens: result.as_ref().ok().map(|r| r.usage.output_tokens),
            success: result.is_ok(),
        }
        .emit();

        result
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_includes_model_segment() {
        let url = converse_url(
            "https://bedrock-runtime.us-east-1.amazonaws.com",
            "anthropic.claude-3-haiku-20240307-v1:0",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/anthropic.claude-3-haiku-20240307-v1:0/converse"
        );
    }

    #[test]
    fn url_escapes_slashes_in_arns() {
        let url = converse_url(
            "http://localhost:9000/",
            "arn:aws:bedrock:us-east-1::foundation-model/amazon.nova-lite-v1:0",
        )
        .unwrap();
        assert!(url.path().contains("foundation-model%2Famazon.nova-lite-v1:0"));
        assert!(url.path().ends_with("/converse"));
    }

    #[test]
    fn url_rejects_empty_model() {
        assert!(converse_url("http://localhost:9000", " ").is_err());
    }

    #[test]
    fn body_with_system_and_parameters() {
        let req = ConverseRequest {
            model_id: "m1".into(),
            system: vec!["Be nice".into()],
            messages: vec![Message::user("Hello")],
            parameters: Some(json!({
                "temperature": 0.2,
                "max_tokens": 256,
                "top_k": 40,
            })),
        };
        let body = build_converse_body(&req);
        assert_eq!(body["system"], json!([{ "text": "Be nice" }]));
        assert_eq!(
            body["messages"],
            json!([{ "role": "user", "content": [{ "text": "Hello" }] }])
        );
        assert_eq!(body["inferenceConfig"]["temperature"], json!(0.2));
        assert_eq!(body["inferenceConfig"]["maxTokens"], json!(256));
        assert_eq!(body["additionalModelRequestFields"]["top_k"], json!(40));
    }

    #[test]
    fn body_without_system_or_parameters_is_minimal() {
        let req = ConverseRequest {
            model_id: "m1".into(),
            messages: vec![Message::user("Hi")],
            ..Default::default()
        };
        let body = build_converse_body(&req);
        assert!(body.get("system").is_none());
        assert!(body.get("inferenceConfig").is_none());
        assert!(body.get("additionalModelRequestFields").is_none());
    }

    #[test]
    fn nested_inference_config_is_merged() {
        let (inference, additional) =
            split_parameters(Some(&json!({ "inferenceConfig": { "maxTokens": 10 } })));
        assert_eq!(inference.get("maxTokens"), Some(&json!(10)));
        assert!(additional.is_empty());
    }

    #[test]
    fn parses_converse_response() {
        let raw = r#"{
            "output": { "message": { "role": "assistant", "content": [{ "text": "Hi there" }] } },
            "stopReason": "end_turn",
            "usage": { "inputTokens": 12, "outputTokens": 3, "totalTokens": 15 },
            "metrics": { "latencyMs": 200 }
        }"#;
        let resp = parse_converse_response(raw).unwrap();
        assert_eq!(resp.text, "Hi there");
        assert_eq!(resp.usage, Usage::new(12, 3));
        assert_eq!(resp.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn skips_non_text_blocks() {
        let raw = r#"{
            "output": { "message": { "content": [{ "reasoningContent": {} }, { "text": "answer" }] } }
        }"#;
        let resp = parse_converse_response(raw).unwrap();
        assert_eq!(resp.text, "answer");
        assert_eq!(resp.usage, Usage::default());
    }

    #[test]
    fn malformed_response_is_an_error() {
        assert!(parse_converse_response("{\"unexpected\": true}").is_err());
    }

    #[test]
    fn error_message_prefers_provider_message() {
        let msg = error_message(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"message":"The security token included in the request is invalid."}"#,
        );
        assert_eq!(msg, "HTTP 403 - The security token included in the request is invalid.");
    }
}

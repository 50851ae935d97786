//! Inference invocation: message assembly, one model call, metrics.

use std::time::Instant;

use cc_aiconfig::metrics::{self, Outcome};
use cc_aiconfig::{AiConfig, MetricsSink};
use cc_domain::error::{Error, Result};
use cc_domain::message::{Message, Role, Turn};
use cc_domain::usage::Usage;
use cc_providers::{ConverseRequest, InferenceClient};

/// Result of one successful model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub text: String,
    pub usage: Usage,
    pub duration_ms: u64,
}

/// Assemble the request for `config`: system templates become system
/// instructions, the remaining templates come first in the message list,
/// then prior turns, then `user_text`.
///
/// The list must open with a user message, so leading assistant templates
/// are dropped.
pub fn build_request(config: &AiConfig, history: &[Turn], user_text: &str) -> Result<ConverseRequest> {
    let model = config
        .model
        .as_ref()
        .ok_or_else(|| Error::AiConfig("AI config names no model".into()))?;

    let mut system = Vec::new();
    let mut messages = Vec::with_capacity(config.messages.len() + history.len() + 1);
    for template in &config.messages {
        match template.role {
            Role::System => system.push(template.content.clone()),
            role => messages.push(Message {
                role,
                content: template.content.clone(),
            }),
        }
    }

    let leading_assistant = messages
        .iter()
        .take_while(|m| m.role == Role::Assistant)
        .count();
    messages.drain(..leading_assistant);

    messages.extend(history.iter().map(Message::from));
    messages.push(Message::user(user_text));

    Ok(ConverseRequest {
        model_id: model.name.clone(),
        system,
        messages,
        parameters: model.parameters.clone(),
    })
}

/// Call the model once and report the outcome to `sink`.
///
/// Failures are recorded (duration and an error marker) before the error
/// is handed back.
pub async fn invoke(
    client: &dyn InferenceClient,
    config: &AiConfig,
    history: &[Turn],
    user_text: &str,
    sink: &dyn MetricsSink,
) -> Result<Invocation> {
    let request = build_request(config, history, user_text)?;

    let started = Instant::now();
    let result = client.converse(request).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(response) => {
            metrics::record(
                sink,
                &Outcome::Success {
                    duration_ms,
                    usage: response.usage,
                },
            )
            .await;
            Ok(Invocation {
                text: response.text,
                usage: response.usage,
                duration_ms,
            })
        }
        Err(e) => {
            metrics::record(sink, &Outcome::Failure { duration_ms }).await;
            Err(e)
        }
    }
}

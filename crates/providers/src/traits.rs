use cc_domain::error::Result;
use cc_domain::message::Message;
use cc_domain::usage::Usage;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic conversation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverseRequest {
    /// Model identifier taken from the AI config.
    pub model_id: String,
    /// System instructions, in template order.
    pub system: Vec<String>,
    /// Conversation messages. Must open with a user message.
    pub messages: Vec<Message>,
    /// Free-form model parameters from the AI config (`temperature`,
    /// `maxTokens`, provider-specific fields...).
    pub parameters: Option<serde_json::Value>,
}

/// A provider-agnostic conversation response.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverseResponse {
    /// Assistant text (first text block of the reply).
    pub text: String,
    pub usage: Usage,
    /// Why the model stopped generating (e.g. `"end_turn"`).
    pub stop_reason: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait every hosted-model adapter implements.
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send one request and wait for the full response.
    async fn converse(&self, req: ConverseRequest) -> Result<ConverseResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}

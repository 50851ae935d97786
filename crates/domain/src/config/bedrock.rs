use serde::{Deserialize, Serialize};

/// Bedrock runtime (Converse API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockConfig {
    #[serde(default = "d_region")]
    pub region: String,
    /// Override the runtime endpoint (e.g. a VPC endpoint or a local stub).
    /// When `None`, `https://bedrock-runtime.<region>.amazonaws.com` is used.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the Bedrock API key (bearer token).
    #[serde(default = "d_token_env")]
    pub token_env: String,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: d_region(),
            endpoint: None,
            token_env: d_token_env(),
            timeout_secs: d_timeout_secs(),
        }
    }
}

impl BedrockConfig {
    pub fn effective_endpoint(&self) -> String {
        match &self.endpoint {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

fn d_region() -> String {
    "us-east-1".into()
}
fn d_token_env() -> String {
    "AWS_BEARER_TOKEN_BEDROCK".into()
}
fn d_timeout_secs() -> u64 {
    120
}

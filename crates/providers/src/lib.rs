pub mod bedrock;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use bedrock::BedrockProvider;
pub use traits::{ConverseRequest, ConverseResponse, InferenceClient};

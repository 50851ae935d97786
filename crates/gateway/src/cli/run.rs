//! `configchat run`: one-shot exchange.
//!
//! Sends a single message through the full pipeline, prints the answer and
//! exits. Useful for scripting and smoke-testing a config.

use std::sync::Arc;

use cc_domain::config::Config;

use crate::bootstrap;
use crate::runtime::{run_exchange, ExchangeInput, ExchangeOutcome, JudgeOutcome};

/// Execute one exchange and print the response.
pub async fn run(
    config: Arc<Config>,
    message: String,
    session_id: String,
    user_id: Option<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config)?;

    let input = ExchangeInput {
        session_id: session_id.clone(),
        message,
        user_id,
        email: None,
    };

    let outcome = run_exchange(&state, input).await?;

    let result = match outcome {
        ExchangeOutcome::Completed(result) => result,
        ExchangeOutcome::Disabled { key } => {
            anyhow::bail!("AI configuration '{key}' is disabled for this context")
        }
    };

    if json_output {
        let judge = result.judge.as_ref().map(|j| match j {
            JudgeOutcome::Evaluated {
                evaluation,
                score,
                usage,
            } => serde_json::json!({
                "evaluation": evaluation,
                "accuracy_score": score,
                "usage": usage,
            }),
            JudgeOutcome::Failed { message } => serde_json::json!({ "error": message }),
        });
        let body = serde_json::json!({
            "response": result.assistant_text,
            "session_id": session_id,
            "model": result.model_id,
            "duration_ms": result.duration_ms,
            "input_tokens": result.input_tokens,
            "output_tokens": result.output_tokens,
            "judge": judge,
        });
        let json = serde_json::to_string_pretty(&body)
            .map_err(|e| anyhow::anyhow!("serializing result: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", result.assistant_text);
    match &result.judge {
        Some(JudgeOutcome::Evaluated {
            score: Some(score), ..
        }) => eprintln!("\x1b[2m[judge score: {score:.2}]\x1b[0m"),
        Some(JudgeOutcome::Evaluated { score: None, .. }) => {
            eprintln!("\x1b[2m[judge: no score]\x1b[0m")
        }
        Some(JudgeOutcome::Failed { message }) => {
            eprintln!("\x1b[2m[judge failed: {message}]\x1b[0m")
        }
        None => {}
    }

    Ok(())
}

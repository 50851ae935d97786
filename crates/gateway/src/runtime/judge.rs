//! Judge evaluation: a second model call that scores the first response.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use cc_aiconfig::AiConfig;
use cc_domain::identity::Identity;
use cc_domain::trace::TraceEvent;
use cc_domain::usage::Usage;

use crate::runtime::invoke;
use crate::state::AppState;

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Score:\s*(\d+\.?\d*)").expect("valid score regex"));
const SCORE_FIELDS: [&str; 3] = ["score", "accuracy", "accuracy_score"];

/// Result of running the judge for one exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeOutcome {
    Evaluated {
        evaluation: String,
        score: Option<f64>,
        usage: Usage,
    },
    Failed {
        message: String,
    },
}

/// The prompt the judge sees: the user's message and the answer it got.
pub fn judge_prompt(user_text: &str, assistant_text: &str) -> String {
    format!("Input: {user_text}\n\nOutput: {assistant_text}")
}

/// Evaluate one exchange with the judge config `judge_key`.
///
/// Returns `None` when the judge config is disabled for `identity`. Errors
/// never escape: they are logged and reported as [`JudgeOutcome::Failed`].
pub async fn evaluate(
    state: &AppState,
    judge_key: &str,
    identity: &Identity,
    user_text: &str,
    assistant_text: &str,
) -> Option<JudgeOutcome> {
    let fetched = state
        .aiconfig
        .config(judge_key, identity, AiConfig::disabled())
        .await;
    if !fetched.config.enabled {
        tracing::debug!(config_key = %judge_key, "judge config disabled, skipping evaluation");
        return None;
    }

    let prompt = judge_prompt(user_text, assistant_text);
    let invocation = match invoke::invoke(
        state.llm.as_ref(),
        &fetched.config,
        &[],
        &prompt,
        fetched.tracker.as_ref(),
    )
    .await
    {
        Ok(inv) => inv,
        Err(e) => {
            tracing::warn!(config_key = %judge_key, error = %e, "judge evaluation failed");
            return Some(JudgeOutcome::Failed {
                message: e.to_string(),
            });
        }
    };

    let score = parse_score(&invocation.text);
    if let Some(value) = score {
        fetched
            .tracker
            .track_metric(&state.config.aiconfig.accuracy_metric, value)
            .await;
    }

    TraceEvent::JudgeScored {
        config_key: judge_key.to_owned(),
        score,
    }
    .emit();

    Some(JudgeOutcome::Evaluated {
        evaluation: invocation.text,
        score,
        usage: invocation.usage,
    })
}

/// Pull a numeric score out of the judge's reply.
///
/// A JSON object reply is searched for `score`, `accuracy`, then
/// `accuracy_score`; values above 1 are percentages and get scaled to
/// `0..=1`. Any other reply is searched for `Score: <number>`.
pub fn parse_score(text: &str) -> Option<f64> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => {
            let score = SCORE_FIELDS
                .iter()
                .filter_map(|field| map.get(*field))
                .find_map(as_number)?;
            Some(if score > 1.0 { score / 100.0 } else { score })
        }
        Ok(_) => None,
        Err(_) => SCORE_RE.captures(text)?.get(1)?.as_str().parse().ok(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

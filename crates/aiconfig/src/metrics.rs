//! Mapping from inference outcomes to metrics sink calls.

use cc_domain::usage::Usage;

use crate::tracker::MetricsSink;

/// Marker attached to failed generations.
pub const INFERENCE_ERROR: &str = "inference_error";

/// How one inference call ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Success { duration_ms: u64, usage: Usage },
    Failure { duration_ms: u64 },
}

impl Outcome {
    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Success { duration_ms, .. } | Self::Failure { duration_ms } => *duration_ms,
        }
    }
}

/// Report `outcome` to `sink`. Never fails.
pub async fn record(sink: &dyn MetricsSink, outcome: &Outcome) {
    match *outcome {
        Outcome::Success { duration_ms, usage } => sink.track_success(usage, duration_ms).await,
        Outcome::Failure { duration_ms } => sink.track_failure(duration_ms, INFERENCE_ERROR).await,
    }
}

//! In-memory metrics sink for tests. Enabled in dependents through the
//! `test-util` feature.

use parking_lot::Mutex;

use cc_domain::usage::Usage;

use crate::tracker::MetricsSink;

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Success { usage: Usage, duration_ms: u64 },
    Failure { duration_ms: u64, marker: String },
    Metric { name: String, value: f64 },
}

/// Sink that keeps every call in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl MetricsSink for RecordingSink {
    async fn track_success(&self, usage: Usage, duration_ms: u64) {
        self.calls.lock().push(SinkCall::Success { usage, duration_ms });
    }

    async fn track_failure(&self, duration_ms: u64, marker: &str) {
        self.calls.lock().push(SinkCall::Failure {
            duration_ms,
            marker: marker.to_owned(),
        });
    }

    async fn track_metric(&self, name: &str, value: f64) {
        self.calls.lock().push(SinkCall::Metric {
            name: name.to_owned(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_sink_keeps_calls_in_order() {
        let sink = RecordingSink::new();
        sink.track_success(Usage::new(3, 4), 50).await;
        sink.track_metric("ai-accuracy", 0.9).await;
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Success { usage: Usage::new(3, 4), duration_ms: 50 },
                SinkCall::Metric { name: "ai-accuracy".into(), value: 0.9 },
            ]
        );
    }
}

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trace export
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Optional OTLP trace export for the `serve` command.
///
/// With no endpoint the gateway writes JSON logs only. `OTEL_EXPORTER_OTLP_ENDPOINT`
/// and `OTEL_SERVICE_NAME` override the file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// OTLP/gRPC collector, e.g. `http://localhost:4317`. Blank disables export.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Reported as `deployment.environment` when set.
    #[serde(default)]
    pub environment: Option<String>,

    /// Fraction of traces kept, `0.0..=1.0`.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            environment: None,
            sample_rate: d_sample_rate(),
        }
    }
}

impl ObservabilityConfig {
    /// Collector endpoint, or `None` when export is off.
    pub fn export_endpoint(&self) -> Option<&str> {
        self.otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Resource attributes attached to every exported span besides
    /// `service.name`.
    pub fn resource_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![("service.version", env!("CARGO_PKG_VERSION").to_owned())];
        if let Some(env) = self.environment.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            attrs.push(("deployment.environment", env.to_owned()));
        }
        attrs
    }
}

fn d_service_name() -> String {
    "configchat".into()
}

fn d_sample_rate() -> f64 {
    1.0
}

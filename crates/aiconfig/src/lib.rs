//! Client side of the remote AI configuration service.
//!
//! - [`client`]: evaluate an AI config for an identity, with a fallback
//!   when the service is unreachable or returns something unusable.
//! - [`tracker`]: the metrics sink bound to one evaluated config.
//! - [`metrics`]: turn an inference outcome into sink calls.

pub mod client;
pub mod metrics;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod tracker;
pub mod types;
pub(crate) mod util;

pub use client::{AiConfigSource, FetchedConfig, LaunchDarklyClient};
pub use metrics::{record, Outcome};
pub use tracker::{AiConfigTracker, MetricsSink, NoopTracker};
pub use types::{AiConfig, ConfigMessage, ModelConfig};

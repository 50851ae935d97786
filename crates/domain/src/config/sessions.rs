use serde::{Deserialize, Serialize};

/// In-memory conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Maximum number of turns kept per session. Oldest user/assistant
    /// pairs are dropped first. `0` keeps everything.
    #[serde(default = "d_max_history_turns")]
    pub max_history_turns: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_history_turns: d_max_history_turns(),
        }
    }
}

fn d_max_history_turns() -> usize {
    100
}

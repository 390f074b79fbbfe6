use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Messaging transport (WhatsApp HTTP bridge)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL of the bridge REST API.
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Env var holding the bridge bearer token. Requests go out
    /// unauthenticated when the var is unset.
    #[serde(default = "d_token_env")]
    pub token_env: String,
    /// How many recent messages to pull as reply context.
    #[serde(default = "d_200")]
    pub history_limit: usize,
    /// Per-request timeout for bridge calls.
    #[serde(default = "d_15000")]
    pub timeout_ms: u64,
    /// Show "typing…" in the chat while a reply is generated.
    #[serde(default = "d_true")]
    pub typing_indicator: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            token_env: d_token_env(),
            history_limit: 200,
            timeout_ms: 15_000,
            typing_indicator: true,
        }
    }
}

fn d_base_url() -> String {
    "http://127.0.0.1:3000".into()
}
fn d_token_env() -> String {
    "WABOT_BRIDGE_TOKEN".into()
}
fn d_200() -> usize {
    200
}
fn d_15000() -> u64 {
    15_000
}
fn d_true() -> bool {
    true
}

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generative-text provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Provider id used in logs and error messages.
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upper bound for a single generation call. The call is abandoned
    /// (and the reply dropped) when it elapses.
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub generation: GenerationOptions,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            id: d_provider_id(),
            base_url: d_base_url(),
            model: d_model(),
            auth: AuthConfig::default(),
            timeout_ms: 30_000,
            generation: GenerationOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Google,
}

/// Sampling parameters sent with every generation request.
///
/// Fixed for the lifetime of the process; callers cannot override them
/// per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default = "d_top_p")]
    pub top_p: f32,
    #[serde(default = "d_top_k")]
    pub top_k: u32,
    #[serde(default = "d_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "d_presence_penalty")]
    pub presence_penalty: f32,
    #[serde(default = "d_frequency_penalty")]
    pub frequency_penalty: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: d_temperature(),
            top_p: d_top_p(),
            top_k: d_top_k(),
            max_output_tokens: d_max_output_tokens(),
            presence_penalty: d_presence_penalty(),
            frequency_penalty: d_frequency_penalty(),
        }
    }
}

/// Where the provider API key comes from.
///
/// Precedence when resolving: `key` (plaintext), OS keychain
/// (`service` + `account`), `env`, then the keychain headless fallback env
/// var `{SERVICE}_{ACCOUNT}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default = "d_key_env")]
    pub env: Option<String>,
    /// Direct key (prefer `env` or the keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g. "wabot").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g. "gemini-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            env: d_key_env(),
            key: None,
            service: None,
            account: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "gemini".into()
}
fn d_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_model() -> String {
    "gemini-2.0-flash".into()
}
fn d_30000() -> u64 {
    30_000
}
fn d_key_env() -> Option<String> {
    Some("GEMINI_API_KEY".into())
}
fn d_temperature() -> f32 {
    0.7
}
fn d_top_p() -> f32 {
    0.9
}
fn d_top_k() -> u32 {
    40
}
fn d_max_output_tokens() -> u32 {
    250
}
fn d_presence_penalty() -> f32 {
    0.6
}
fn d_frequency_penalty() -> f32 {
    0.4
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::Serialize;

/// Structured trace events emitted across all wabot crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ContactResolved {
        raw_id: String,
        canonical: String,
        category: Option<String>,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    ReplyDispatched {
        chat_id: String,
        category: String,
        history_turns: usize,
        reply_chars: usize,
        duration_ms: u64,
    },
    BirthdaySent {
        group_id: String,
        name: String,
        with_image: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "wb_event");
    }
}

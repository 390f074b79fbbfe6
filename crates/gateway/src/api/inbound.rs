//! Inbound message webhook.
//!
//! `POST /v1/inbound` receives one message event from the WhatsApp bridge,
//! acknowledges it immediately and runs the reply pipeline on a spawned
//! task. Events carrying a `message_id` already seen within the dedupe TTL
//! are acknowledged but not dispatched again.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::runtime::dispatch::InboundMessage;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct InboundEnvelope {
    /// Participant id of the author (`{phone}@s.whatsapp.net` or bare).
    pub sender: String,
    /// Message text. Media-only messages arrive with an empty body.
    #[serde(default)]
    pub body: String,
    /// Chat to reply into; defaults to `sender`.
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub from_me: bool,
    /// Transport message id, used for idempotency.
    #[serde(default)]
    pub message_id: Option<String>,
}

impl InboundEnvelope {
    fn into_message(self) -> InboundMessage {
        let chat_id = self
            .chat_id
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.sender.clone());
        InboundMessage {
            sender: self.sender,
            chat_id,
            body: self.body,
            from_me: self.from_me,
            message_id: self.message_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InboundAck {
    pub accepted: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/inbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn inbound(
    State(state): State<AppState>,
    Json(envelope): Json<InboundEnvelope>,
) -> impl IntoResponse {
    if envelope.sender.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "sender is required" })),
        )
            .into_response();
    }

    if let Some(id) = envelope.message_id.as_deref() {
        if !state.dedupe.check_and_insert(id) {
            tracing::debug!(message_id = %id, "duplicate inbound message");
            return (
                StatusCode::OK,
                Json(InboundAck { accepted: false, duplicate: true }),
            )
                .into_response();
        }
    }

    let msg = envelope.into_message();
    let span = tracing::info_span!("inbound", chat_id = %msg.chat_id);
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(
        async move {
            let outcome = dispatcher.handle(msg).await;
            tracing::debug!(?outcome, "dispatch finished");
        }
        .instrument(span),
    );

    (
        StatusCode::ACCEPTED,
        Json(InboundAck { accepted: true, duplicate: false }),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DedupeStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Remembers message ids for `ttl`.
pub struct DedupeStore {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl DedupeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// `true` if `id` is new (and is now remembered), `false` if it was
    /// seen within the TTL.
    pub fn check_and_insert(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock();
        match seen.get(id) {
            Some(at) if now.duration_since(*at) < self.ttl => false,
            _ => {
                seen.insert(id.to_owned(), now);
                true
            }
        }
    }

    /// Forget ids older than the TTL.
    pub fn prune(&self) {
        let ttl = self.ttl;
        self.seen.lock().retain(|_, at| at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

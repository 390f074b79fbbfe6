//! Inbound message dispatcher.
//!
//! Linear pipeline per message: resolve sender → fetch and normalize
//! history → generate → send. Every failure ends the pipeline with an
//! [`DispatchOutcome`]; nothing is propagated to the caller.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use wb_domain::config::{canonical_id, is_group_id};
use wb_domain::trace::TraceEvent;
use wb_domain::turn::{ConversationTurn, TurnRole};

use crate::directory::ContactDirectory;
use crate::runtime::conversation_lock::ConversationLocks;
use crate::runtime::history::normalize;
use crate::runtime::prompts::select_prompt;
use crate::runtime::reply::{ReplyGenerator, ReplyOutcome};
use crate::transport::ChatTransport;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A message event delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Participant id of the author.
    pub sender: String,
    /// Chat the reply goes to. Equal to `sender` for direct chats; only
    /// direct chats are answered.
    pub chat_id: String,
    pub body: String,
    /// Authored by the bot's own account.
    pub from_me: bool,
    pub message_id: Option<String>,
}

impl InboundMessage {
    /// A direct-chat message from `sender`.
    pub fn direct(sender: impl Into<String>, body: impl Into<String>) -> Self {
        let sender = sender.into();
        Self {
            chat_id: sender.clone(),
            sender,
            body: body.into(),
            from_me: false,
            message_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    FromMe,
    EmptyBody,
    NotDirectChat,
    UnknownSender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortStage {
    FetchHistory,
    Generation,
    Send,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Ignored { reason: IgnoreReason },
    Aborted { stage: AbortStage },
    Sent { chat_id: String, chars: usize },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dispatcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Dispatcher {
    directory: Arc<ContactDirectory>,
    transport: Arc<dyn ChatTransport>,
    generator: Arc<ReplyGenerator>,
    locks: Arc<ConversationLocks>,
    history_limit: usize,
    typing_indicator: bool,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<ContactDirectory>,
        transport: Arc<dyn ChatTransport>,
        generator: Arc<ReplyGenerator>,
        locks: Arc<ConversationLocks>,
    ) -> Self {
        Self {
            directory,
            transport,
            generator,
            locks,
            history_limit: 200,
            typing_indicator: true,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_typing_indicator(mut self, enabled: bool) -> Self {
        self.typing_indicator = enabled;
        self
    }

    pub fn locks(&self) -> &Arc<ConversationLocks> {
        &self.locks
    }

    /// Run the reply pipeline for one message.
    pub async fn handle(&self, msg: InboundMessage) -> DispatchOutcome {
        if msg.from_me {
            return DispatchOutcome::Ignored { reason: IgnoreReason::FromMe };
        }
        if msg.body.trim().is_empty() {
            tracing::debug!(chat_id = %msg.chat_id, "ignoring message without text");
            return DispatchOutcome::Ignored { reason: IgnoreReason::EmptyBody };
        }
        if is_group_id(&msg.chat_id) || canonical_id(&msg.chat_id) != canonical_id(&msg.sender) {
            tracing::debug!(chat_id = %msg.chat_id, sender = %msg.sender, "not a direct chat, ignoring");
            return DispatchOutcome::Ignored { reason: IgnoreReason::NotDirectChat };
        }

        let category = self.directory.lookup(&msg.sender);
        TraceEvent::ContactResolved {
            raw_id: msg.sender.clone(),
            canonical: ContactDirectory::canonicalize(&msg.sender),
            category: category.map(|c| c.to_string()),
        }
        .emit();
        let Some(category) = category else {
            tracing::debug!(sender = %msg.sender, "sender not in contacts, ignoring");
            return DispatchOutcome::Ignored { reason: IgnoreReason::UnknownSender };
        };

        let started = Instant::now();
        let chat_id = msg.chat_id.as_str();

        // Keyed on the canonical id so suffix variants of one chat share a lock.
        let _permit = match self.locks.acquire(&canonical_id(chat_id)).await {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(chat_id = %chat_id, error = %e, "conversation lock unavailable, continuing unserialized");
                None
            }
        };

        if self.typing_indicator {
            if let Err(e) = self.transport.send_typing(chat_id).await {
                tracing::debug!(chat_id = %chat_id, error = %e, "typing indicator failed");
            }
        }

        let raw = match self.transport.fetch_history(chat_id, self.history_limit).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(chat_id = %chat_id, error = %e, "history fetch failed");
                return DispatchOutcome::Aborted { stage: AbortStage::FetchHistory };
            }
        };
        let mut history = normalize(&raw, self.history_limit);
        drop_trailing_user(&mut history);
        let history_turns = history.len();

        let text = match self
            .generator
            .generate(select_prompt(category), history, &msg.body)
            .await
        {
            ReplyOutcome::Generated(text) => text,
            ReplyOutcome::Failed(failure) => {
                tracing::warn!(chat_id = %chat_id, category = %category, %failure, "no reply generated");
                return DispatchOutcome::Aborted { stage: AbortStage::Generation };
            }
        };

        let reply = text.trim();
        if let Err(e) = self.transport.send_text(chat_id, reply).await {
            tracing::warn!(chat_id = %chat_id, error = %e, "sending reply failed");
            return DispatchOutcome::Aborted { stage: AbortStage::Send };
        }

        let chars = reply.chars().count();
        TraceEvent::ReplyDispatched {
            chat_id: chat_id.to_string(),
            category: category.to_string(),
            history_turns,
            reply_chars: chars,
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        DispatchOutcome::Sent {
            chat_id: chat_id.to_string(),
            chars,
        }
    }
}

/// The message being answered is sent as the final user turn, so the
/// history must end on a model turn. A trailing user turn is either the
/// echo of that message or, after a burst, the first of an unanswered run;
/// both are removed.
fn drop_trailing_user(history: &mut Vec<ConversationTurn>) {
    if history.last().is_some_and(|t| t.role == TurnRole::User) {
        history.pop();
    }
}

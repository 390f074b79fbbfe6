//! Reply generation: one bounded provider call, outcome as a value.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use wb_domain::config::GenerationOptions;
use wb_domain::trace::TraceEvent;
use wb_domain::turn::ConversationTurn;
use wb_providers::{ChatRequest, LlmProvider};

/// Why no reply text was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// Transport, auth or API error from the provider.
    Provider(String),
    Timeout,
    /// The provider answered with no usable text (e.g. a safety stop).
    Empty,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::Provider(msg) => write!(f, "provider error: {msg}"),
            GenerationFailure::Timeout => f.write_str("generation timed out"),
            GenerationFailure::Empty => f.write_str("provider returned no text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Generated(String),
    Failed(GenerationFailure),
}

pub struct ReplyGenerator {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    timeout: Duration,
}

impl ReplyGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, options: GenerationOptions, timeout: Duration) -> Self {
        Self {
            provider,
            options,
            timeout,
        }
    }

    /// Ask the provider for a reply to `message` given `history`.
    ///
    /// Never retries. Successful text is returned verbatim.
    pub async fn generate(
        &self,
        system_instruction: &str,
        history: Vec<ConversationTurn>,
        message: &str,
    ) -> ReplyOutcome {
        let req = ChatRequest::new(message, self.options)
            .with_system_instruction(system_instruction)
            .with_history(history);

        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.provider.chat(&req)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let resp = match result {
            Err(_) => {
                tracing::warn!(
                    provider = %self.provider.provider_id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "generation timed out"
                );
                return ReplyOutcome::Failed(GenerationFailure::Timeout);
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = %self.provider.provider_id(), error = %e, "generation failed");
                return ReplyOutcome::Failed(GenerationFailure::Provider(e.to_string()));
            }
            Ok(Ok(resp)) => resp,
        };

        TraceEvent::LlmRequest {
            provider: self.provider.provider_id().to_string(),
            model: resp.model.clone(),
            duration_ms,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
        }
        .emit();

        if resp.content.trim().is_empty() {
            tracing::warn!(
                provider = %self.provider.provider_id(),
                finish_reason = ?resp.finish_reason,
                "provider returned empty text"
            );
            return ReplyOutcome::Failed(GenerationFailure::Empty);
        }
        ReplyOutcome::Generated(resp.content)
    }
}

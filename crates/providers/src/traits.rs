use wb_domain::config::GenerationOptions;
use wb_domain::error::Result;
use wb_domain::turn::ConversationTurn;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic text generation request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Persona / tone instruction sent out of band from the conversation.
    pub system_instruction: Option<String>,
    /// Prior turns, oldest first. Expected to start with a user turn and
    /// alternate roles.
    pub history: Vec<ConversationTurn>,
    /// The new message to answer. Sent as the final user turn.
    pub message: String,
    /// Sampling parameters.
    pub options: GenerationOptions,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            system_instruction: None,
            history: Vec::new(),
            message: message.into(),
            options,
            model: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }
}

/// A provider-agnostic text generation response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Concatenated text of the first candidate. May be empty.
    pub content: String,
    /// Token usage information.
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
    /// The reason the model stopped generating (e.g. "stop", "length", "safety").
    pub finish_reason: Option<String>,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait that every text-generation adapter must implement.
///
/// Adapters translate between our internal types and the wire format of a
/// provider's HTTP API.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a generation request and wait for the full response.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}

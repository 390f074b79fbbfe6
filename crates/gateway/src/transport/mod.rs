//! Messaging transport seam.
//!
//! The dispatcher and birthday job talk to the chat network only through
//! [`ChatTransport`]; [`bridge::BridgeClient`] is the production
//! implementation over a WhatsApp HTTP bridge.

pub mod bridge;

use serde::Serialize;
use wb_domain::error::Result;
use wb_domain::turn::RawMessage;

pub use bridge::BridgeClient;

/// An image post with an optional caption and mention list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMessage {
    /// Publicly reachable image URL; the bridge downloads it.
    pub url: String,
    pub caption: String,
    /// Full participant ids (`{phone}@s.whatsapp.net`).
    pub mentions: Vec<String>,
}

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Most recent `limit` messages of a chat, oldest first.
    async fn fetch_history(&self, chat_id: &str, limit: usize) -> Result<Vec<RawMessage>>;

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;

    /// Show the "typing…" indicator in a chat.
    async fn send_typing(&self, chat_id: &str) -> Result<()>;

    async fn send_image(&self, chat_id: &str, image: &ImageMessage) -> Result<()>;
}

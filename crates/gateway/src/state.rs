use std::sync::Arc;

use wb_domain::config::Config;

use crate::api::inbound::DedupeStore;
use crate::directory::ContactDirectory;
use crate::runtime::birthdays::BirthdayJob;
use crate::runtime::conversation_lock::ConversationLocks;
use crate::runtime::dispatch::Dispatcher;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: Arc<ContactDirectory>,
    pub dispatcher: Arc<Dispatcher>,
    /// Present when a birthday group is configured.
    pub birthdays: Option<Arc<BirthdayJob>>,
    pub locks: Arc<ConversationLocks>,
    /// Inbound idempotency by message id.
    pub dedupe: Arc<DedupeStore>,
    /// SHA-256 of the API bearer token; `None` in dev mode.
    pub api_token_hash: Option<Vec<u8>>,
}

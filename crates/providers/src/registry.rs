//! Provider construction.
//!
//! Reads the [`LlmConfig`], resolves authentication and instantiates the
//! adapter matching its `provider` kind.

use crate::google::GoogleProvider;
use crate::traits::LlmProvider;
use std::sync::Arc;
use wb_domain::config::{LlmConfig, ProviderKind};
use wb_domain::error::Result;

/// Build the configured provider.
///
/// Auth keys are resolved eagerly (env vars and the keychain are read here).
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::Google => Arc::new(GoogleProvider::from_config(config)?),
    };
    tracing::info!(
        provider_id = %config.id,
        kind = ?config.provider,
        model = %config.model,
        "registered LLM provider"
    );
    Ok(provider)
}

pub mod google;
pub mod registry;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use google::GoogleProvider;
pub use registry::build_provider;
pub use traits::{ChatRequest, ChatResponse, LlmProvider, Usage};
pub use util::{keychain_fallback_env_name, resolve_api_key, store_in_keychain};

mod birthdays;
mod contacts;
mod llm;
mod observability;
mod server;
mod transport;
mod workspace;

pub use birthdays::*;
pub use contacts::*;
pub use llm::*;
pub use observability::*;
pub use server::*;
pub use transport::*;
pub use workspace::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::contact::Category;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub contacts: ContactsConfig,
    #[serde(default)]
    pub birthdays: BirthdaysConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }

        self.validate_llm(&mut errors);

        if self.transport.base_url.is_empty() {
            errors.push(ConfigError::error("transport.base_url", "base_url must not be empty"));
        }
        if self.transport.history_limit == 0 {
            errors.push(ConfigError::error(
                "transport.history_limit",
                "history_limit must be greater than 0",
            ));
        }

        self.validate_contacts(&mut errors);
        self.validate_birthdays(&mut errors);

        errors
    }

    fn validate_llm(&self, errors: &mut Vec<ConfigError>) {
        if self.llm.base_url.is_empty() {
            errors.push(ConfigError::error("llm.base_url", "base_url must not be empty"));
        }
        if self.llm.model.is_empty() {
            errors.push(ConfigError::error("llm.model", "model must not be empty"));
        }
        if self.llm.timeout_ms == 0 {
            errors.push(ConfigError::error("llm.timeout_ms", "timeout_ms must be greater than 0"));
        }
        let g = &self.llm.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            errors.push(ConfigError::error(
                "llm.generation.temperature",
                "temperature must be within 0.0..=2.0",
            ));
        }
        if !(0.0..=1.0).contains(&g.top_p) {
            errors.push(ConfigError::error(
                "llm.generation.top_p",
                "top_p must be within 0.0..=1.0",
            ));
        }
        if g.max_output_tokens == 0 {
            errors.push(ConfigError::error(
                "llm.generation.max_output_tokens",
                "max_output_tokens must be greater than 0",
            ));
        }
    }

    fn validate_contacts(&self, errors: &mut Vec<ConfigError>) {
        if self.contacts.is_empty() {
            errors.push(ConfigError::warning(
                "contacts",
                "no contacts configured; the bot will never reply",
            ));
            return;
        }

        // Same number listed in two tables: the higher-priority table wins.
        let mut seen: HashMap<String, Category> = HashMap::new();
        for (category, table) in self.contacts.tables() {
            for (i, entry) in table.iter().enumerate() {
                let field = format!("contacts.{}[{i}]", table_key(category));
                let canonical = canonical_id(&entry.id);
                if canonical.is_empty() {
                    errors.push(ConfigError::error(field, "id contains no digits"));
                    continue;
                }
                if let Some(first) = seen.get(&canonical) {
                    errors.push(ConfigError::warning(
                        field,
                        format!(
                            "{} ({}) is already listed under {first}; that entry wins",
                            entry.name, entry.id
                        ),
                    ));
                } else {
                    seen.insert(canonical, category);
                }
            }
        }
    }

    fn validate_birthdays(&self, errors: &mut Vec<ConfigError>) {
        let b = &self.birthdays;
        if let Err(e) = crate::cron::validate_cron(&b.cron) {
            errors.push(ConfigError::error("birthdays.cron", e));
        }
        if let Err(e) = crate::cron::validate_timezone(&b.timezone) {
            errors.push(ConfigError::error("birthdays.timezone", e));
        }
        if !b.enabled {
            return;
        }
        if b.group_id.is_empty() {
            errors.push(ConfigError::error(
                "birthdays.group_id",
                "group_id is required when birthdays are enabled",
            ));
        }
        if b.roster_url.is_empty() {
            errors.push(ConfigError::error(
                "birthdays.roster_url",
                "roster_url is required when birthdays are enabled",
            ));
        }
    }
}

fn table_key(category: Category) -> &'static str {
    match category {
        Category::FamilyElder => "family_elder",
        Category::MaleFriend => "male_friends",
        Category::FemaleFriend => "female_friends",
        Category::Other => "other",
    }
}

/// Canonical form of a participant identifier: the digits before any
/// transport suffix (`@c.us`, `@s.whatsapp.net`, ...) or device tag
/// (`:12`).
///
/// Every component that compares phone numbers goes through this.
pub fn canonical_id(raw: &str) -> String {
    let local = raw.split('@').next().unwrap_or("");
    let local = local.split(':').next().unwrap_or("");
    local.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whether `chat_id` addresses a group rather than a single participant.
pub fn is_group_id(chat_id: &str) -> bool {
    chat_id.trim().ends_with("@g.us")
}

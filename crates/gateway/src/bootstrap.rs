//! AppState construction and background-task spawning extracted from `main.rs`.
//!
//! `serve` and the one-shot CLI commands (`birthdays run`) share this boot
//! path so they see exactly the same wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;

use wb_domain::config::{Config, ConfigSeverity};
use wb_domain::cron::parse_tz;
use wb_providers::{build_provider, LlmProvider};

use crate::api::auth::token_hash_from_env;
use crate::api::inbound::DedupeStore;
use crate::directory::ContactDirectory;
use crate::roster::{RosterClient, RosterSource};
use crate::runtime::birthdays::{local_today, run_scheduler, BirthdayJob};
use crate::runtime::conversation_lock::ConversationLocks;
use crate::runtime::dispatch::Dispatcher;
use crate::runtime::reply::ReplyGenerator;
use crate::runtime::sent_log::SentLog;
use crate::state::AppState;
use crate::transport::{BridgeClient, ChatTransport};

/// Inbound message ids are remembered this long.
const DEDUPE_TTL: Duration = Duration::from_secs(86_400);

/// Validate config, build the production clients and return a fully-wired
/// [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── LLM provider ─────────────────────────────────────────────────
    let provider = build_provider(&config.llm).context("initializing LLM provider")?;
    tracing::info!(
        provider = %provider.provider_id(),
        model = %config.llm.model,
        "LLM provider ready"
    );

    // ── Messaging transport ──────────────────────────────────────────
    let transport: Arc<dyn ChatTransport> = Arc::new(
        BridgeClient::from_config(&config.transport).context("creating bridge client")?,
    );
    tracing::info!(url = %config.transport.base_url, "bridge client ready");

    // ── Roster client ────────────────────────────────────────────────
    let roster: Arc<dyn RosterSource> = Arc::new(
        RosterClient::new(
            &config.birthdays.roster_url,
            Duration::from_millis(config.transport.timeout_ms),
        )
        .context("creating roster client")?,
    );

    Ok(assemble(config, provider, transport, roster))
}

/// Wire the runtime from already-built clients.
pub fn assemble(
    config: Arc<Config>,
    provider: Arc<dyn LlmProvider>,
    transport: Arc<dyn ChatTransport>,
    roster: Arc<dyn RosterSource>,
) -> AppState {
    let directory = Arc::new(ContactDirectory::from_config(&config.contacts));
    tracing::info!(contacts = directory.len(), "contact directory loaded");

    let generator = Arc::new(ReplyGenerator::new(
        provider,
        config.llm.generation,
        Duration::from_millis(config.llm.timeout_ms),
    ));

    let locks = Arc::new(ConversationLocks::new());
    let dispatcher = Arc::new(
        Dispatcher::new(directory.clone(), transport.clone(), generator.clone(), locks.clone())
            .with_history_limit(config.transport.history_limit)
            .with_typing_indicator(config.transport.typing_indicator),
    );

    // ── Birthday job ─────────────────────────────────────────────────
    let birthdays = if config.birthdays.group_id.trim().is_empty() {
        if config.birthdays.enabled {
            tracing::warn!("birthdays enabled but no group_id configured; scheduler disabled");
        }
        None
    } else {
        let today = local_today(&config.birthdays.timezone);
        let sent_log = Arc::new(SentLog::open(&config.workspace.state_path, today));
        Some(Arc::new(BirthdayJob::new(
            roster,
            generator,
            transport,
            sent_log,
            config.birthdays.group_id.clone(),
            config.birthdays.group_name.clone(),
        )))
    };

    let api_token_hash = token_hash_from_env(&config.server.api_token_env);

    AppState {
        config,
        directory,
        dispatcher,
        birthdays,
        locks,
        dedupe: Arc::new(DedupeStore::new(DEDUPE_TTL)),
        api_token_hash,
    }
}

/// Spawn periodic maintenance and, when enabled, the birthday scheduler.
pub fn spawn_background_tasks(state: &AppState, shutdown: watch::Receiver<bool>) {
    // ── Idle lock + dedupe pruning ───────────────────────────────────
    {
        let locks = state.locks.clone();
        let dedupe = state.dedupe.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                locks.prune_idle();
                dedupe.prune();
            }
        });
    }

    // ── Birthday scheduler ───────────────────────────────────────────
    let cfg = &state.config.birthdays;
    if !cfg.enabled {
        tracing::info!("birthday scheduler disabled");
        return;
    }
    if let Some(job) = state.birthdays.clone() {
        tokio::spawn(run_scheduler(
            job,
            cfg.cron.clone(),
            parse_tz(&cfg.timezone),
            cfg.dry_run,
            shutdown,
        ));
    }
}

//! Birthday announcements for the classmates group.
//!
//! [`BirthdayJob::run_for`] is one pass over the roster for a given local
//! date; [`run_scheduler`] drives it from a cron expression.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tracing::Instrument;
use wb_domain::config::canonical_id;
use wb_domain::cron::{cron_next_tz, parse_tz};
use wb_domain::trace::TraceEvent;

use crate::roster::{RosterEntry, RosterSource};
use crate::runtime::prompts::{birthday_prompt, BIRTHDAY_SYSTEM_INSTRUCTION};
use crate::runtime::reply::{ReplyGenerator, ReplyOutcome};
use crate::runtime::sent_log::SentLog;
use crate::transport::{ChatTransport, ImageMessage};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Report
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthdayDraft {
    pub name: String,
    pub message: String,
}

/// Summary of one run. Counts are per person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthdayReport {
    pub date: NaiveDate,
    pub dry_run: bool,
    /// People whose birthday falls on `date`.
    pub matched: usize,
    pub sent: usize,
    pub skipped_already_sent: usize,
    pub failed: usize,
    /// Generated messages, filled only in dry-run mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub drafts: Vec<BirthdayDraft>,
}

impl BirthdayReport {
    fn empty(date: NaiveDate, dry_run: bool) -> Self {
        Self {
            date,
            dry_run,
            matched: 0,
            sent: 0,
            skipped_already_sent: 0,
            failed: 0,
            drafts: Vec::new(),
        }
    }
}

enum Announced {
    Sent,
    Drafted(BirthdayDraft),
    Failed,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Job
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct BirthdayJob {
    roster: Arc<dyn RosterSource>,
    generator: Arc<ReplyGenerator>,
    transport: Arc<dyn ChatTransport>,
    sent_log: Arc<SentLog>,
    group_id: String,
    group_name: String,
    /// Scheduled and manual runs never overlap.
    run_lock: tokio::sync::Mutex<()>,
}

impl BirthdayJob {
    pub fn new(
        roster: Arc<dyn RosterSource>,
        generator: Arc<ReplyGenerator>,
        transport: Arc<dyn ChatTransport>,
        sent_log: Arc<SentLog>,
        group_id: impl Into<String>,
        group_name: impl Into<String>,
    ) -> Self {
        Self {
            roster,
            generator,
            transport,
            sent_log,
            group_id: group_id.into(),
            group_name: group_name.into(),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Announce every birthday on `date` that has not been announced yet.
    ///
    /// In dry-run mode messages are generated and returned as drafts but
    /// nothing is sent or recorded.
    pub async fn run_for(&self, date: NaiveDate, dry_run: bool) -> BirthdayReport {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();
        let mut report = BirthdayReport::empty(date, dry_run);

        let roster = match self.roster.fetch().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, %date, "roster fetch failed, no birthdays announced");
                return report;
            }
        };

        let mut seen = HashSet::new();
        let mut due = Vec::new();
        for entry in roster.into_iter().filter(|e| e.has_birthday_on(date)) {
            if !seen.insert(canonical_id(&entry.phone_number)) {
                continue;
            }
            report.matched += 1;
            if self.sent_log.was_sent(date, &entry.phone_number) {
                report.skipped_already_sent += 1;
                continue;
            }
            due.push(entry);
        }

        let results = join_all(due.iter().map(|e| self.announce(date, e, dry_run))).await;
        for result in results {
            match result {
                Announced::Sent => report.sent += 1,
                Announced::Drafted(draft) => report.drafts.push(draft),
                Announced::Failed => report.failed += 1,
            }
        }

        tracing::info!(
            %date,
            dry_run,
            matched = report.matched,
            sent = report.sent,
            skipped = report.skipped_already_sent,
            failed = report.failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "birthday run finished"
        );
        report
    }

    async fn announce(&self, date: NaiveDate, entry: &RosterEntry, dry_run: bool) -> Announced {
        let prompt = birthday_prompt(entry, &self.group_name);
        let message = match self
            .generator
            .generate(BIRTHDAY_SYSTEM_INSTRUCTION, Vec::new(), &prompt)
            .await
        {
            ReplyOutcome::Generated(text) => text.trim().to_string(),
            ReplyOutcome::Failed(failure) => {
                tracing::warn!(name = %entry.name, %failure, "birthday message not generated");
                return Announced::Failed;
            }
        };

        if dry_run {
            return Announced::Drafted(BirthdayDraft {
                name: entry.name.clone(),
                message,
            });
        }

        let phone = canonical_id(&entry.phone_number);
        let sent = match &entry.profile_url {
            Some(url) => {
                let image = ImageMessage {
                    url: url.clone(),
                    caption: message,
                    mentions: vec![format!("{phone}@s.whatsapp.net")],
                };
                self.transport.send_image(&self.group_id, &image).await
            }
            None => self.transport.send_text(&self.group_id, &message).await,
        };
        if let Err(e) = sent {
            tracing::warn!(name = %entry.name, error = %e, "birthday message not sent");
            return Announced::Failed;
        }

        if let Err(e) = self.sent_log.record(date, &phone, &entry.name) {
            tracing::warn!(name = %entry.name, error = %e, "failed to persist sent-log entry");
        }
        TraceEvent::BirthdaySent {
            group_id: self.group_id.clone(),
            name: entry.name.clone(),
            with_image: entry.profile_url.is_some(),
        }
        .emit();
        Announced::Sent
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Current calendar date in the IANA timezone `tz` (UTC if unknown).
pub fn local_today(tz: &str) -> NaiveDate {
    Utc::now().with_timezone(&parse_tz(tz)).date_naive()
}

/// Sleep until each cron occurrence in `tz` and run the job for that local
/// date. Returns when `shutdown` flips to `true` or the cron never fires.
pub async fn run_scheduler(
    job: Arc<BirthdayJob>,
    cron: String,
    tz: chrono_tz::Tz,
    dry_run: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(cron = %cron, tz = %tz, group_id = %job.group_id(), "birthday scheduler started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        let now = Utc::now();
        let Some(next) = cron_next_tz(&cron, &now, tz) else {
            tracing::warn!(cron = %cron, "cron expression never fires, birthday scheduler stopped");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!(next = %next, wait_secs = wait.as_secs(), "next birthday run scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                // Sender gone means the process is going down.
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let date = next.with_timezone(&tz).date_naive();
        let span = tracing::info_span!("birthday_run", %date);
        job.run_for(date, dry_run).instrument(span).await;
    }
    tracing::info!("birthday scheduler stopped");
}

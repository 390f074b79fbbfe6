//! Birthday sent log: which (date, classmate) announcements already went out.
//!
//! Persisted as JSONL under the state directory so a restart on the same
//! day does not announce anyone twice.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use wb_domain::config::canonical_id;
use wb_domain::error::Result;

/// Entries older than this (relative to the date the log is opened) are
/// dropped on load.
const RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SentRecord {
    date: NaiveDate,
    phone: String,
    name: String,
    sent_at: DateTime<Utc>,
}

pub struct SentLog {
    sent: Mutex<HashSet<(NaiveDate, String)>>,
    persist_path: PathBuf,
}

impl SentLog {
    /// Load `{state_path}/birthday_sent.jsonl`, compacting stale entries.
    pub fn open(state_path: &Path, today: NaiveDate) -> Self {
        let persist_path = state_path.join("birthday_sent.jsonl");
        let mut sent = HashSet::new();

        if let Ok(data) = std::fs::read_to_string(&persist_path) {
            let cutoff = today - Duration::days(RETENTION_DAYS);
            let mut kept = Vec::new();
            let mut total = 0usize;
            for line in data.lines().filter(|l| !l.trim().is_empty()) {
                total += 1;
                match serde_json::from_str::<SentRecord>(line) {
                    Ok(r) if r.date >= cutoff => kept.push(r),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "skipping unreadable sent-log line"),
                }
            }
            if kept.len() < total {
                Self::rewrite_jsonl(&persist_path, &kept);
            }
            for r in &kept {
                sent.insert((r.date, canonical_id(&r.phone)));
            }
            if !kept.is_empty() {
                tracing::info!(count = kept.len(), "loaded birthday sent log");
            }
        }

        Self {
            sent: Mutex::new(sent),
            persist_path,
        }
    }

    pub fn was_sent(&self, date: NaiveDate, phone: &str) -> bool {
        self.sent.lock().contains(&(date, canonical_id(phone)))
    }

    /// Mark an announcement as sent. The in-memory mark always sticks; the
    /// error only reports that the disk append failed.
    pub fn record(&self, date: NaiveDate, phone: &str, name: &str) -> Result<()> {
        self.sent.lock().insert((date, canonical_id(phone)));
        let record = SentRecord {
            date,
            phone: canonical_id(phone),
            name: name.to_string(),
            sent_at: Utc::now(),
        };
        Self::persist_one(&self.persist_path, &record)
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist_one(path: &Path, record: &SentRecord) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(record)?;
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(f, "{json}")?;
        Ok(())
    }

    fn rewrite_jsonl(path: &Path, records: &[SentRecord]) {
        let tmp = path.with_extension("jsonl.tmp");
        let write = || -> std::io::Result<()> {
            let mut f = std::fs::File::create(&tmp)?;
            for r in records {
                let json = serde_json::to_string(r).map_err(std::io::Error::other)?;
                writeln!(f, "{json}")?;
            }
            f.sync_all()
        };
        match write() {
            Ok(()) => {
                if let Err(e) = std::fs::rename(&tmp, path) {
                    tracing::warn!(error = %e, "failed to replace sent log");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to compact sent log");
                let _ = std::fs::remove_file(&tmp);
            }
        }
    }
}

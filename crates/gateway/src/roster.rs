//! Client for the classmates roster service (`GET {roster_url}/birthday`).

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wb_domain::error::{Error, Result};
use wb_providers::util::from_reqwest;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Roster entries
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One classmate as the bot sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
    pub profile_url: Option<String>,
    pub gender: Option<String>,
}

/// Wire shape. The service speaks camelCase; snake_case is accepted too.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRosterEntry {
    name: String,
    #[serde(alias = "phone_number")]
    phone_number: String,
    #[serde(alias = "birthday_date")]
    birthday_date: String,
    #[serde(default, alias = "profile_url")]
    profile_url: Option<String>,
    #[serde(default)]
    gender: Option<String>,
}

impl RosterEntry {
    /// True when `date` is this person's birthday. Leap-day birthdays are
    /// celebrated on 28 February in common years.
    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        let (m, d) = (self.birthday.month(), self.birthday.day());
        if m == date.month() && d == date.day() {
            return true;
        }
        m == 2 && d == 29 && date.month() == 2 && date.day() == 28 && !is_leap_year(date.year())
    }

    fn from_raw(raw: RawRosterEntry) -> Option<Self> {
        let birthday = parse_birthday(&raw.birthday_date)?;
        Some(Self {
            name: raw.name,
            phone_number: raw.phone_number,
            birthday,
            profile_url: raw.profile_url.filter(|u| !u.trim().is_empty()),
            gender: raw.gender.filter(|g| !g.trim().is_empty()),
        })
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Accepts RFC 3339 timestamps (taken as UTC dates), naive datetimes and
/// plain `YYYY-MM-DD`.
pub(crate) fn parse_birthday(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a roster response body, skipping entries that do not fit.
pub(crate) fn parse_roster(body: &str) -> Result<Vec<RosterEntry>> {
    let v: Value =
        serde_json::from_str(body).map_err(|e| Error::Roster(format!("invalid JSON: {e}")))?;
    let items = match v {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(Error::Roster("response has no entry list".into())),
        },
        _ => return Err(Error::Roster("unexpected response shape".into())),
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let raw: RawRosterEntry = match serde_json::from_value(item) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed roster entry");
                continue;
            }
        };
        let name = raw.name.clone();
        let date = raw.birthday_date.clone();
        match RosterEntry::from_raw(raw) {
            Some(entry) => entries.push(entry),
            None => tracing::warn!(name = %name, birthday = %date, "skipping roster entry with unparseable birthday"),
        }
    }
    Ok(entries)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Source trait + HTTP client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RosterEntry>>;
}

pub struct RosterClient {
    url: String,
    client: reqwest::Client,
}

impl RosterClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            url: format!("{}/birthday", base_url.trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait::async_trait]
impl RosterSource for RosterClient {
    async fn fetch(&self) -> Result<Vec<RosterEntry>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Roster(format!("GET {}: {e}", self.url)))?;
        let status = resp.status();
        let body = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(Error::Roster(format!("HTTP {} from {}", status.as_u16(), self.url)));
        }
        let entries = parse_roster(&body)?;
        tracing::debug!(count = entries.len(), "roster fetched");
        Ok(entries)
    }
}

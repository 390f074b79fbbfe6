use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Birthday announcements
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthdaysConfig {
    #[serde(default)]
    pub enabled: bool,
    /// 5-field cron expression evaluated in `timezone`.
    #[serde(default = "d_cron")]
    pub cron: String,
    /// IANA timezone used both for the cron and for "today".
    #[serde(default = "d_timezone")]
    pub timezone: String,
    /// Group chat that receives the announcements.
    #[serde(default)]
    pub group_id: String,
    /// Group display name, used in the generation prompt.
    #[serde(default = "d_group_name")]
    pub group_name: String,
    /// Roster service base URL; the bot reads `{roster_url}/birthday`.
    #[serde(default = "d_roster_url")]
    pub roster_url: String,
    /// Generate messages but never send or record them.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for BirthdaysConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: d_cron(),
            timezone: d_timezone(),
            group_id: String::new(),
            group_name: d_group_name(),
            roster_url: d_roster_url(),
            dry_run: false,
        }
    }
}

fn d_cron() -> String {
    "0 12 * * *".into()
}
fn d_timezone() -> String {
    "Africa/Lagos".into()
}
fn d_group_name() -> String {
    "St. Augustine's College, Year 2020".into()
}
fn d_roster_url() -> String {
    "http://localhost:8000/api".into()
}

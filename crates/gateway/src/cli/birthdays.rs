use std::sync::Arc;

use chrono::NaiveDate;
use wb_domain::config::Config;

use crate::bootstrap::build_app_state;
use crate::runtime::birthdays::local_today;

/// One birthday pass outside the server, printing the report as JSON.
pub async fn run(config: Arc<Config>, dry_run: bool, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(|| local_today(&config.birthdays.timezone));
    let dry_run = dry_run || config.birthdays.dry_run;
    let state = build_app_state(config).await?;

    let Some(job) = state.birthdays else {
        anyhow::bail!("birthdays.group_id is not set; nothing to announce to");
    };

    let report = job.run_for(date, dry_run).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.failed > 0 {
        anyhow::bail!("{} announcement(s) failed", report.failed);
    }
    Ok(())
}

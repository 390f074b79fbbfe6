pub mod birthdays;
pub mod config;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// wabot: WhatsApp auto-replies in your own voice, plus class birthday shout-outs.
#[derive(Debug, Parser)]
#[command(name = "wabot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the webhook server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Birthday announcement utilities.
    #[command(subcommand)]
    Birthdays(BirthdaysCommand),
    /// Show which contact category a chat id resolves to.
    Lookup {
        /// Participant id, with or without the `@s.whatsapp.net` suffix.
        id: String,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
    /// Store the Gemini API key in the OS keychain.
    SetSecret,
    /// Read and display (masked) the Gemini API key from the OS keychain.
    GetSecret,
}

#[derive(Debug, Subcommand)]
pub enum BirthdaysCommand {
    /// Announce today's birthdays once, then exit.
    Run {
        /// Generate and print messages without sending them.
        #[arg(long)]
        dry_run: bool,
        /// Run for this local date instead of today (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `WABOT_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
///
/// [`Config`]: wb_domain::config::Config
pub fn load_config() -> anyhow::Result<(wb_domain::config::Config, String)> {
    let config_path = std::env::var("WABOT_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        wb_domain::config::Config::default()
    };

    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["wabot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn birthdays_run_parses_date() {
        let cli = Cli::try_parse_from(["wabot", "birthdays", "run", "--dry-run", "--date", "2025-07-21"]).unwrap();
        match cli.command {
            Some(Command::Birthdays(BirthdaysCommand::Run { dry_run, date })) => {
                assert!(dry_run);
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 21));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["wabot", "birthdays", "run", "--date", "21/07/2025"]).is_err());
    }
}

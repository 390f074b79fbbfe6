use anyhow::Context;
use wb_domain::config::{Config, ConfigSeverity};
use wb_providers::util::{resolve_from_keychain, store_in_keychain};

const DEFAULT_KEYCHAIN_SERVICE: &str = "wabot";
const DEFAULT_KEYCHAIN_ACCOUNT: &str = "gemini-api-key";

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when errors (not just warnings) were found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config).context("serializing config")?;
    print!("{output}");
    Ok(())
}

/// Keychain coordinates from `[llm.auth]`, with wabot defaults.
fn keychain_slot(config: &Config) -> (&str, &str) {
    let auth = &config.llm.auth;
    (
        auth.service.as_deref().unwrap_or(DEFAULT_KEYCHAIN_SERVICE),
        auth.account.as_deref().unwrap_or(DEFAULT_KEYCHAIN_ACCOUNT),
    )
}

/// Prompt for the Gemini API key and store it in the OS keychain.
pub fn set_secret(config: &Config) -> anyhow::Result<()> {
    let (service, account) = keychain_slot(config);
    let secret = rpassword::prompt_password_stderr(&format!("API key for {service}/{account}: "))
        .context("reading API key from terminal")?;
    let secret = secret.trim();
    if secret.is_empty() {
        anyhow::bail!("empty API key, nothing stored");
    }
    store_in_keychain(service, account, secret)?;
    println!("Stored API key in keychain ({service}/{account}).");
    if config.llm.auth.service.is_none() || config.llm.auth.account.is_none() {
        println!(
            "Add to [llm.auth] in your config to use it:\n  service = \"{service}\"\n  account = \"{account}\""
        );
    }
    Ok(())
}

/// Print the stored API key with all but the last four characters masked.
pub fn get_secret(config: &Config) -> anyhow::Result<()> {
    let (service, account) = keychain_slot(config);
    let secret = resolve_from_keychain(service, account)?;
    println!("{service}/{account}: {}", mask(&secret));
    Ok(())
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

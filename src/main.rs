//! zbt - Zimbra filter rules <-> Sieve
//!
//! Without a script argument the account's rules are fetched and printed as
//! Sieve. With one, the script is converted and uploaded in their place.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use zimbratosthenes::config::PASSWORD_ENV;
use zimbratosthenes::model::profile::AccountProfile;
use zimbratosthenes::net::zimbra::{ZimbraClient, DEFAULT_TIMEOUT};
use zimbratosthenes::record::schema::FilterRule;
use zimbratosthenes::store::script_io::{self, Source};
use zimbratosthenes::store::profile_store;
use zimbratosthenes::{display_rules, parse_records, rules_from_records, rules_to_records, text_to_rules};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    " ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "zbt")]
#[command(about = "Zimbra filter rules to/from Sieve scripts")]
#[command(version = VERSION)]
struct Cli {
    /// Sieve script to upload (`-` for standard input)
    script: Option<PathBuf>,

    /// Stored account profile to use (default: the first one)
    #[arg(short, long)]
    profile: Option<String>,

    /// SOAP service URL, overrides the profile
    #[arg(long)]
    url: Option<String>,

    /// Account name, overrides the profile
    #[arg(long)]
    user: Option<String>,

    /// Upload without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Print records as JSON instead of uploading or rendering Sieve
    #[arg(long)]
    json: bool,

    /// Render a local JSON record file instead of fetching
    #[arg(long, conflicts_with = "script")]
    records: Option<PathBuf>,

    /// Seconds to wait for each server request
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match (&cli.script, &cli.records) {
        (Some(script), _) => upload(&cli, script).await,
        (None, Some(records)) => render_local(&cli, records),
        (None, None) => fetch(&cli).await,
    }
}

/// Convert a script and replace the account's rules with it.
async fn upload(cli: &Cli, script: &Path) -> Result<()> {
    let source = Source::of(script);
    if source == Source::Stdin && !cli.yes {
        bail!("reading the script from standard input requires --yes");
    }

    let text = script_io::load_script(script)?;
    let rules = text_to_rules(&text)
        .with_context(|| format!("cannot convert {}", script.display()))?
        .value;
    let records = rules_to_records(&rules).value;

    if cli.json {
        print_json(&records)?;
        return Ok(());
    }

    let account = account(cli)?;
    if !cli.yes && !confirm(&format!(
        "Replace the filter rules of {} with {} rule(s) from {}?",
        account.username,
        records.len(),
        script.display()
    ))? {
        bail!("aborted");
    }

    let password = password(&account, source)?;
    let mut client = ZimbraClient::new(&account.url, Duration::from_secs(cli.timeout))?;
    client.connect(&account.username, &password).await?;
    client.modify_rules(&records).await?;
    client.disconnect();
    Ok(())
}

async fn fetch(cli: &Cli) -> Result<()> {
    let account = account(cli)?;
    let password = password(&account, Source::File)?;
    let mut client = ZimbraClient::new(&account.url, Duration::from_secs(cli.timeout))?;
    client.connect(&account.username, &password).await?;
    let records = client.get_rules().await?;
    client.disconnect();
    emit(cli, records)
}

fn render_local(cli: &Cli, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let records = parse_records(&json)?;
    emit(cli, records)
}

fn emit(cli: &Cli, records: Vec<FilterRule>) -> Result<()> {
    if cli.json {
        return print_json(&records);
    }
    let rules = rules_from_records(records)?.value;
    let text = display_rules(&rules)?.value;
    print!("{text}");
    Ok(())
}

fn print_json(records: &[FilterRule]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

/// The selected stored profile with command line overrides applied.
fn account(cli: &Cli) -> Result<AccountProfile> {
    let profiles = profile_store::load_profiles()?;
    let stored = profile_store::select(&profiles, cli.profile.as_deref())?;
    if stored.is_none() && (cli.url.is_none() || cli.user.is_none()) {
        bail!("no stored profile; pass --url and --user");
    }
    let account = stored
        .unwrap_or_default()
        .with_overrides(cli.url.clone(), cli.user.clone());
    tracing::info!("using {} at {}", account.username, account.url);
    Ok(account)
}

fn password(account: &AccountProfile, source: Source) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    if source == Source::Stdin {
        bail!("standard input holds the script; set {PASSWORD_ENV}");
    }
    let password = rpassword::prompt_password(format!("Password for {}: ", account.username))?;
    Ok(password)
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{question} [y/N] "))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn prompt(message: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    stderr.write_all(message.as_bytes())?;
    stderr.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use endfield_checkin::config::Config;
use endfield_checkin::runner::{RunSummary, Runner};
use endfield_checkin::skport::headers::ClientProfile;
use endfield_checkin::skport::sign::{sign, signing_string};

#[derive(Parser)]
#[command(
    name = "endfield-checkin",
    version,
    about = "Daily attendance check-in for Arknights: Endfield via SKPort",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides CHECKIN_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Read configuration from a TOML file instead of the environment
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check in every configured account (default)
    Run,

    /// List the roles bound to every configured account
    Roles,

    /// Compute a request signature
    Sign {
        /// Request path, e.g. /api/v1/game/player/binding
        #[arg(long)]
        path: String,

        /// Unix timestamp in seconds
        #[arg(long)]
        timestamp: String,

        /// Session secret (empty for an unsigned request)
        #[arg(long, default_value = "")]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(Commands::Sign {
        path,
        timestamp,
        secret,
    }) = &cli.command
    {
        print_signature(path, timestamp, secret)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(cli.config.as_deref())?;

    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&format, &config.logging.level, cli.verbose)?;

    tracing::info!(
        accounts = config.accounts.len(),
        notify = config.notify.discord_webhook.is_some(),
        "Endfield check-in starting"
    );

    let runner = Runner::new(&config).context("Failed to create runner")?;

    let summary = match cli.command {
        Some(Commands::Roles) => runner.list_roles().await,
        _ => runner.run().await,
    };

    Ok(finish(&summary))
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("endfield_checkin=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("endfield_checkin={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn print_signature(path: &str, timestamp: &str, secret: &str) -> Result<()> {
    let profile = ClientProfile::default();
    println!(
        "signed string: {}",
        signing_string(path, timestamp, &profile.platform, &profile.version_name)
    );
    match sign(
        path,
        timestamp,
        secret,
        &profile.platform,
        &profile.version_name,
    )? {
        Some(signature) => println!("sign: {signature}"),
        None => println!("sign: unsigned (empty secret)"),
    }
    Ok(())
}

fn finish(summary: &RunSummary) -> ExitCode {
    println!();
    println!("{}", summary.report.render());

    if summary.failed {
        eprintln!();
        eprintln!("One or more errors occurred.");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

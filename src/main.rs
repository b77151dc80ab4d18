use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use homework_watchbot::config::{self, Credentials};
use homework_watchbot::notifier::TelegramNotifier;
use homework_watchbot::poller::Poller;
use homework_watchbot::practicum::PracticumClient;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to an optional YAML settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("homework_watchbot=debug,info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let settings = config::load(args.config.as_deref())?;

    let creds = Credentials::from_env();
    if !config::check_credentials(&creds) {
        bail!(
            "missing required environment variables: {}",
            creds.missing().join(", ")
        );
    }

    let source = PracticumClient::new(
        creds.practicum_token.clone(),
        settings.endpoint_url()?,
        settings.request_timeout(),
    )
    .context("failed to build HTTP client")?;
    let notifier = TelegramNotifier::new(&creds.telegram_token, &creds.telegram_chat_id);

    let mut poller = Poller::new(source, notifier, settings.retry_period())
        .with_notify_timeout(settings.request_timeout());

    info!(endpoint = %settings.practicum.endpoint, "starting homework watch bot");
    tokio::select! {
        err = poller.run() => {
            error!(critical = true, %err, "bot stopped");
            Err(err.into())
        }
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl-C")?;
            info!("interrupted, shutting down");
            Ok(())
        }
    }
}

use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use adapters::{ConfigError, Configuration, HttpMatchFetcher, SmtpNotifier, TokioTimer, config_path};
use application::ports::in_::{DynFetcher, DynNotifier, DynTimer, PollError, Supervisor};

#[derive(Debug, Error)]
enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), DaemonError> {
    let path = config_path();
    let config = Configuration::load(&path)?;
    info!(config = %path.display(), users = config.users.len(), "Configuration loaded");

    let fetcher: DynFetcher = Arc::new(HttpMatchFetcher::new(&config.api)?);
    let notifier: DynNotifier = Arc::new(SmtpNotifier::new(&config.mailer)?);
    let timer: DynTimer = Arc::new(TokioTimer);
    let supervisor = Supervisor::new(fetcher, notifier, timer, config.poll_settings());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    {
        let shutdown_tx = Arc::clone(&shutdown_tx);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown requested, workers stop after their current cycle");
                    shutdown_tx.send_replace(true);
                }
                Err(err) => warn!(error = %err, "Cannot listen for Ctrl+C, only a kill stops the daemon"),
            }
        });
    }

    info!(version = env!("CARGO_PKG_VERSION"), "sc2alert started");
    supervisor.run_all(&config.profiles(), shutdown_rx).await?;
    info!("sc2alert stopped");
    Ok(())
}

pub mod classify;
pub mod ingest;
pub mod journal;
pub mod models;
pub mod sensing;
pub mod settings;
pub mod shutdown;
pub mod tracker;
pub mod utils;

pub use classify::{classify, Category};
pub use models::{MessageRecord, Sample, SessionRecord};
pub use sensing::PollingDriver;
pub use settings::{Settings, SlackSettings};
pub use tracker::SessionTracker;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use journal::SessionLog;
use sensing::{AppleScriptSampler, SensingController};

const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
const INGEST_STOP_GRACE: Duration = Duration::from_millis(500);

pub fn run() {
    // RUST_LOG wins when set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Activity logger (sessions + Slack messages) starting. Ctrl+C to stop.");

    let settings = Settings::load();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("worklog")
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(serve(settings));
    // A relay blocked on stdin must not hold the process open.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
    info!("Stopped.");
}

/// Open the session log, start both pipelines and wait for a termination
/// signal. Only a failure to open the session log is returned as an error.
async fn serve(settings: Settings) -> Result<()> {
    let session_log = SessionLog::open_in(&settings.session_dir, Utc::now())
        .context("failed to prepare session log")?;
    if let Some(path) = session_log.path() {
        info!("Logging sessions to: {}", path.display());
    }

    let shutdown = CancellationToken::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let ingestor = match SlackSettings::from_env() {
        Ok(slack) => {
            match ingest::start_ingestor(&slack, &settings.message_dir, shutdown.child_token())
                .await
            {
                Ok(handle) => {
                    info!("Slack ingest enabled, saving messages to {}", settings.message_dir.display());
                    Some(handle)
                }
                Err(err) => {
                    warn!("Slack ingest disabled: {err:#}");
                    None
                }
            }
        }
        Err(reason) => {
            warn!("Slack ingest disabled: {reason}");
            None
        }
    };

    let mut sensing = SensingController::new();
    if let Err(err) = sensing.start_sensing(
        PollingDriver::new(session_log),
        Arc::new(AppleScriptSampler::new(settings.sample_timeout())),
        &settings,
        shutdown.child_token(),
    ) {
        error!("Failed to start sensing: {err:#}");
        shutdown.cancel();
    }

    shutdown.cancelled().await;

    if let Err(err) = sensing.stop_sensing().await {
        error!("Sensing shutdown failed: {err:#}");
    }

    if let Some(handle) = ingestor {
        match tokio::time::timeout(INGEST_STOP_GRACE, handle).await {
            Ok(Ok(stats)) => info!(
                "Slack ingest stopped: {} stored, {} dropped, {} failed",
                stats.stored, stats.dropped, stats.failed
            ),
            Ok(Err(err)) => warn!("Slack ingest task failed: {err}"),
            Err(_) => warn!("Slack ingest did not stop in time; abandoning it"),
        }
    }

    Ok(())
}

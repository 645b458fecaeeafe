//! Slack message capture, running beside the polling driver.

mod event;
mod filter;
mod relay;
mod worker;

pub use event::{parse_envelope, InboundEvent, MessageEvent};
pub use filter::{DropReason, MessageFilter};
pub use relay::spawn_line_relay;
pub use worker::{ingest_loop, IngestStats};

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::journal::MessageStore;
use crate::settings::SlackSettings;

const EVENT_BUFFER: usize = 256;

/// Start the relay and the ingest loop for `slack`, writing into
/// `message_dir`. Returns the ingest task handle.
pub async fn start_ingestor(
    slack: &SlackSettings,
    message_dir: &Path,
    cancel_token: CancellationToken,
) -> Result<JoinHandle<IngestStats>> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    match &slack.events_path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open event source {}", path.display()))?;
            spawn_line_relay(BufReader::new(file), tx);
            log::info!("[slack] reading events from {}", path.display());
        }
        None => {
            spawn_line_relay(BufReader::new(tokio::io::stdin()), tx);
            log::info!("[slack] reading events from stdin");
        }
    }

    let filter = MessageFilter::new(slack.self_user_id.clone(), slack.log_all);
    if slack.log_all {
        log::warn!("[slack] SLACK_LOG_ALL=1: saving messages from every author");
    }

    Ok(tokio::spawn(ingest_loop(
        rx,
        MessageStore::new(message_dir),
        filter,
        slack.debug,
        cancel_token,
    )))
}

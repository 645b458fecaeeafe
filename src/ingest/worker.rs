use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::journal::MessageStore;

use super::event::InboundEvent;
use super::filter::MessageFilter;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub stored: u64,
    pub dropped: u64,
    pub failed: u64,
}

/// Persist every admitted message from `events` until the stream ends or
/// `cancel_token` fires. Each message is written as soon as it arrives, so
/// stopping never loses buffered work.
pub async fn ingest_loop(
    mut events: mpsc::Receiver<InboundEvent>,
    store: MessageStore,
    filter: MessageFilter,
    verbose: bool,
    cancel_token: CancellationToken,
) -> IngestStats {
    let mut stats = IngestStats::default();

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => {
                    log_info!("message stream closed");
                    break;
                }
            },
        };
        stats.received += 1;

        let message = match event {
            InboundEvent::Message(message) => message,
            InboundEvent::Other(kind) => {
                log_debug!("[slack] ignoring {kind} event");
                stats.dropped += 1;
                continue;
            }
        };

        if let Err(reason) = filter.admit(&message) {
            stats.dropped += 1;
            if verbose {
                log::info!(
                    "[slack] drop {} user={} ch={}",
                    reason.as_str(),
                    message.user,
                    message.channel
                );
            } else {
                log_debug!("[slack] drop {} ch={}", reason.as_str(), message.channel);
            }
            continue;
        }

        let now = Utc::now();
        let record = filter.to_record(&message, now);
        let writer = store.clone();
        match tokio::task::spawn_blocking(move || writer.save(&record, now)).await {
            Ok(Ok(path)) => {
                stats.stored += 1;
                log_info!("[slack] saved message to {}", path.display());
            }
            Ok(Err(err)) => {
                stats.failed += 1;
                log_error!("save slack message failed: {err:#}");
            }
            Err(join_err) => {
                stats.failed += 1;
                log_error!("message writer task failed: {join_err}");
            }
        }
    }

    log_info!(
        "message ingestor stopped (received {}, stored {}, dropped {}, failed {})",
        stats.received,
        stats.stored,
        stats.dropped,
        stats.failed
    );
    stats
}

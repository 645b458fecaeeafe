use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::event::{parse_envelope, InboundEvent};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Forward newline-delimited frames from an external event bridge into
/// `tx`. Blank lines, control frames and malformed frames are skipped. The
/// task ends at end of input, on a read error, or when the receiver is gone.
pub fn spawn_line_relay<R>(reader: R, tx: mpsc::Sender<InboundEvent>) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    log_info!("event relay reached end of input");
                    break;
                }
                Err(err) => {
                    log_warn!("event relay read failed: {err}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_envelope(&line) {
                Ok(Some(event)) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => log_debug!("dropping malformed frame: {err:#}"),
            }
        }
    })
}

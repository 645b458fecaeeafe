use anyhow::{anyhow, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::journal::SyncSink;
use crate::models::Sample;

use super::driver::PollingDriver;
use super::sampler::FrontmostSampler;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Sample on every tick until `cancel_token` fires, then run the driver's
/// single shutdown pass. Returns the closed sink.
pub async fn polling_loop<W>(
    mut driver: PollingDriver<W>,
    sampler: Arc<dyn FrontmostSampler>,
    interval: Duration,
    sample_timeout: Duration,
    cancel_token: CancellationToken,
) -> Result<W>
where
    W: SyncSink + Send + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            outcome = sample_once(&sampler, sample_timeout) => outcome,
        };

        match outcome {
            Ok(sample) => driver.handle_sample(sample),
            Err(err) => driver.handle_sample_error(&err),
        }
    }

    log_info!("polling loop shutting down");
    let result = driver.shutdown(Utc::now());
    if let Err(err) = &result {
        log_error!("session log close failed: {err:#}");
    }
    result
}

/// Run the blocking sampler on the blocking pool, bounded by `timeout`.
/// Samplers are expected to enforce their own deadline; if one overruns, its
/// late result is dropped.
async fn sample_once(sampler: &Arc<dyn FrontmostSampler>, timeout: Duration) -> Result<Sample> {
    let sampler = Arc::clone(sampler);
    let worker = tokio::task::spawn_blocking(move || sampler.sample());

    match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(Ok(window))) => Ok(Sample::new(window.application, window.title, Utc::now())),
        Ok(Ok(Err(err))) => Err(err),
        Ok(Err(join_err)) => Err(anyhow!("sampler worker join failed: {join_err}")),
        Err(_) => Err(anyhow!(
            "sampler timed out after {}ms",
            timeout.as_millis()
        )),
    }
}

use anyhow::{bail, Context, Result};
use log::info;
use std::fs::File;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::settings::Settings;

use super::driver::PollingDriver;
use super::loop_worker::polling_loop;
use super::sampler::FrontmostSampler;

/// Owns the polling task for the lifetime of the process.
pub struct SensingController {
    handle: Option<JoinHandle<Result<File>>>,
    cancel_token: Option<CancellationToken>,
}

impl SensingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the polling loop. It stops when `cancel_token` (or a parent of
    /// it) is cancelled, or when [`stop_sensing`](Self::stop_sensing) is called.
    pub fn start_sensing(
        &mut self,
        driver: PollingDriver,
        sampler: Arc<dyn FrontmostSampler>,
        settings: &Settings,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sensing already active");
        }

        info!(
            "Starting sensing loop (interval {}ms, sample timeout {}ms)",
            settings.poll_interval_ms, settings.sample_timeout_ms
        );

        let handle = tokio::spawn(polling_loop(
            driver,
            sampler,
            settings.poll_interval(),
            settings.sample_timeout(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel the loop and wait for its shutdown pass to finish.
    pub async fn stop_sensing(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sensing loop task failed to join")?
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SensingController {
    fn default() -> Self {
        Self::new()
    }
}

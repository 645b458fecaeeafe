use std::fs::File;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::journal::{JsonArrayWriter, SyncSink};
use crate::models::{Sample, SessionRecord};
use crate::tracker::SessionTracker;
use crate::utils::logging::shorten;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const TITLE_PREVIEW_CHARS: usize = 80;

/// Owns the session tracker and the session container for one run.
pub struct PollingDriver<W: SyncSink = File> {
    tracker: SessionTracker,
    log: JsonArrayWriter<W>,
    failed_appends: usize,
}

impl<W: SyncSink> PollingDriver<W> {
    pub fn new(log: JsonArrayWriter<W>) -> Self {
        Self {
            tracker: SessionTracker::new(),
            log,
            failed_appends: 0,
        }
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn records_written(&self) -> usize {
        self.log.records_written()
    }

    pub fn failed_appends(&self) -> usize {
        self.failed_appends
    }

    /// Feed one successful sample; persists the previous session if this
    /// sample ends it.
    pub fn handle_sample(&mut self, sample: Sample) {
        let now = sample.timestamp;
        let was_idle = self.tracker.active().is_none();
        let finished = self.tracker.observe(sample, now);
        let started_new = was_idle || finished.is_some();

        if let Some(record) = finished {
            self.persist(&record, false);
        }
        if started_new {
            if let Some(active) = self.tracker.active() {
                log_info!(
                    "{} | start | {} | {} - {}",
                    now.to_rfc3339(),
                    active.category,
                    active.application,
                    shorten(&active.window_title, TITLE_PREVIEW_CHARS)
                );
            }
        }
    }

    /// A failed sample skips the tick; the open session stays open.
    pub fn handle_sample_error(&mut self, err: &anyhow::Error) {
        log_warn!("sample skipped: {err:#}");
    }

    /// Finalize the open session at `now`, append it, and close the container.
    /// Consumes the driver so the pass runs once.
    pub fn shutdown(mut self, now: DateTime<Utc>) -> Result<W> {
        if let Some(record) = self.tracker.close(now) {
            self.persist(&record, true);
        }
        log_info!(
            "closing session log ({} written, {} failed)",
            self.log.records_written(),
            self.failed_appends
        );
        self.log.close().context("failed to close session log")
    }

    fn persist(&mut self, record: &SessionRecord, on_exit: bool) {
        let suffix = if on_exit { " (on exit)" } else { "" };
        match self.log.append(record) {
            Ok(()) => log_info!(
                "{} | end   | {} | dur={}s{suffix}",
                record.end.to_rfc3339(),
                record.category,
                record.duration_seconds
            ),
            Err(err) => {
                self.failed_appends += 1;
                let dump = serde_json::to_string(record).unwrap_or_default();
                log_error!("session log append failed{suffix}: {err:#}; record: {dump}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::io::{self, Write};

    fn at(offset_ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::milliseconds(offset_ms)
    }

    fn parse(bytes: &[u8]) -> Vec<SessionRecord> {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn transition_is_persisted_and_new_session_stays_open() {
        let mut driver = PollingDriver::new(JsonArrayWriter::new(Vec::new()).unwrap());
        driver.handle_sample(Sample::new("Editor", "main.go - proj", at(0)));
        driver.handle_sample(Sample::new("Editor", "main.go - proj", at(1500)));
        driver.handle_sample(Sample::new("Browser", "github.com/foo", at(3000)));

        assert_eq!(driver.records_written(), 1);
        assert_eq!(driver.tracker().active().unwrap().application, "Browser");

        let records = parse(&driver.shutdown(at(4000)).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].application, "Editor");
        assert_eq!(records[0].duration_seconds, 3);
        assert_eq!(records[1].application, "Browser");
        assert_eq!(records[1].end, at(4000));
    }

    #[test]
    fn sample_error_keeps_session_open() {
        let mut driver = PollingDriver::new(JsonArrayWriter::new(Vec::new()).unwrap());
        driver.handle_sample(Sample::new("Finder", "Desktop", at(0)));
        driver.handle_sample_error(&anyhow::anyhow!("osascript timed out"));
        driver.handle_sample(Sample::new("Finder", "Desktop", at(3000)));

        assert_eq!(driver.records_written(), 0);
        let records = parse(&driver.shutdown(at(10_000)).unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start, at(0));
        assert_eq!(records[0].duration_seconds, 10);
    }

    #[test]
    fn shutdown_without_samples_writes_empty_container() {
        let driver = PollingDriver::new(JsonArrayWriter::new(Vec::new()).unwrap());
        assert!(parse(&driver.shutdown(at(0)).unwrap()).is_empty());
    }

    /// Sink whose writes fail while `broken` is set.
    struct FlakySink {
        bytes: Vec<u8>,
        broken: bool,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.broken {
                return Err(io::Error::new(io::ErrorKind::Other, "io error"));
            }
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SyncSink for FlakySink {
        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.bytes.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn failed_append_does_not_stop_tracking() {
        let sink = FlakySink {
            bytes: Vec::new(),
            broken: false,
        };
        let mut driver = PollingDriver::new(JsonArrayWriter::new(sink).unwrap());
        driver.handle_sample(Sample::new("Slack", "general", at(0)));

        driver.log_sink_mut().broken = true;
        driver.handle_sample(Sample::new("Finder", "Desktop", at(2000)));
        assert_eq!(driver.failed_appends(), 1);
        assert_eq!(driver.tracker().active().unwrap().application, "Finder");

        driver.log_sink_mut().broken = false;
        let sink = driver.shutdown(at(5000)).unwrap();
        let records = parse(&sink.bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].application, "Finder");
        assert_eq!(records[0].duration_seconds, 3);
    }

    impl<W: SyncSink> PollingDriver<W> {
        fn log_sink_mut(&mut self) -> &mut W {
            self.log.sink_mut()
        }
    }
}

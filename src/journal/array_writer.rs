use std::{
    fs::{self, File},
    io::{self, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

const OPEN_TOKEN: &[u8] = b"[\n";
const SEPARATOR: &[u8] = b",\n";
const CLOSE_TOKEN: &[u8] = b"\n]\n";

/// A `Write` that can force its contents to stable storage and cut itself
/// back to an earlier length.
pub trait SyncSink: Write {
    fn sync(&mut self) -> io::Result<()>;

    /// Drop everything past `len` bytes and continue writing from there.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl SyncSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

impl SyncSink for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        Vec::truncate(self, len);
        Ok(())
    }
}

/// Appends records to a JSON array one at a time.
///
/// Every successful [`append`](Self::append) is flushed and synced, so after
/// any append the file holds `[` followed by complete records and only lacks
/// the closing `]`. A failed append is cut back off the sink before the next
/// write touches it.
pub struct JsonArrayWriter<W: SyncSink> {
    path: Option<PathBuf>,
    sink: W,
    wrote_first: bool,
    records_written: usize,
    /// Length of the sink up to the last complete record.
    committed_len: u64,
    /// A failed append left bytes past `committed_len` that are still there.
    needs_rollback: bool,
}

impl JsonArrayWriter<File> {
    /// Create `dir` if needed and start `activity_<local start time>.json`
    /// inside it.
    pub fn open_in(dir: &Path, started_at: DateTime<Utc>) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;

        let name = format!(
            "activity_{}.json",
            started_at.with_timezone(&Local).format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(name);
        let file = File::create(&path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;

        let mut writer = Self::new(file)?;
        writer.path = Some(path);
        Ok(writer)
    }
}

impl<W: SyncSink> JsonArrayWriter<W> {
    /// Wrap `sink` and write the opening bracket.
    pub fn new(mut sink: W) -> Result<Self> {
        sink.write_all(OPEN_TOKEN).context("failed to write array opening")?;
        sink.flush().context("failed to flush array opening")?;

        Ok(Self {
            path: None,
            sink,
            wrote_first: false,
            records_written: 0,
            committed_len: OPEN_TOKEN.len() as u64,
            needs_rollback: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    #[cfg(test)]
    pub(crate) fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Serialize `record`, write it after a separator when it is not the
    /// first, then flush and sync. On error the sink is cut back to the last
    /// complete record and nothing is marked as written.
    pub fn append<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let body = serde_json::to_vec(record).context("failed to serialize record")?;
        self.rollback()?;

        let mut chunk = Vec::with_capacity(body.len() + SEPARATOR.len());
        if self.wrote_first {
            chunk.extend_from_slice(SEPARATOR);
        }
        chunk.extend_from_slice(&body);

        if let Err(err) = self.write_chunk(&chunk) {
            self.needs_rollback = true;
            // Retried on the next append or close if this fails too.
            let _ = self.rollback();
            return Err(err);
        }

        self.committed_len += chunk.len() as u64;
        self.wrote_first = true;
        self.records_written += 1;
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.sink.write_all(chunk).context("failed to write record")?;
        self.sink.flush().context("failed to flush record")?;
        self.sink.sync().context("failed to sync record")?;
        Ok(())
    }

    /// Cut off whatever a failed append left past the last complete record.
    fn rollback(&mut self) -> Result<()> {
        if !self.needs_rollback {
            return Ok(());
        }
        self.sink
            .truncate(self.committed_len)
            .context("failed to discard partial record")?;
        self.needs_rollback = false;
        Ok(())
    }

    /// Write the closing bracket and hand back the sink.
    pub fn close(mut self) -> Result<W> {
        self.rollback()?;
        self.sink.write_all(CLOSE_TOKEN).context("failed to write array closing")?;
        self.sink.flush().context("failed to flush array closing")?;
        self.sink.sync().context("failed to sync array closing")?;
        Ok(self.sink)
    }
}

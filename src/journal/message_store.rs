use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};

use crate::models::MessageRecord;

const MAX_FRAGMENT_CHARS: usize = 64;
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Writes each message record to its own pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct MessageStore {
    dir: PathBuf,
}

impl MessageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `record` as `msg_<local time with millis>_<title>.json`.
    /// Returns the path written.
    pub fn save(&self, record: &MessageRecord, saved_at: DateTime<Utc>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create message directory {}", self.dir.display())
        })?;

        let stem = format!(
            "msg_{}_{}",
            saved_at.with_timezone(&Local).format("%Y%m%d_%H%M%S%.3f"),
            sanitize_fragment(&record.title)
        );
        let (path, mut file) = self.create_unique(&stem)?;

        serde_json::to_writer_pretty(&mut file, record)
            .with_context(|| format!("failed to serialize message to {}", path.display()))?;
        file.write_all(b"\n")
            .and_then(|_| file.flush())
            .with_context(|| format!("failed to write message to {}", path.display()))?;

        Ok(path)
    }

    fn create_unique(&self, stem: &str) -> Result<(PathBuf, File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}_{attempt}.json")
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to create {}", path.display()))
                }
            }
        }
        anyhow::bail!("no free message file name for {stem} in {}", self.dir.display())
    }
}

/// Make `title` safe as part of a file name: spaces become `_`, path
/// separators and other reserved or control characters become `-`.
pub fn sanitize_fragment(title: &str) -> String {
    title
        .chars()
        .take(MAX_FRAGMENT_CHARS)
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn message(title: &str, text: &str) -> MessageRecord {
        MessageRecord {
            timestamp: Utc::now(),
            source: "Slack".into(),
            direction: Some("sent".into()),
            title: title.into(),
            text: text.into(),
            metadata: BTreeMap::from([("channelId".to_string(), title.to_string())]),
        }
    }

    #[test]
    fn sanitizes_reserved_characters() {
        assert_eq!(sanitize_fragment("a b/c\\d"), "a_b-c-d");
        assert_eq!(sanitize_fragment("x:y*z?\"<>|\n"), "x-y-z------");
        assert_eq!(sanitize_fragment(&"c".repeat(100)).len(), MAX_FRAGMENT_CHARS);
    }

    #[test]
    fn writes_pretty_unescaped_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(dir.path().join("messages"));
        let record = message("C123", "<b>fish & chips</b> 🐟");

        let path = store.save(&record, Utc::now()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("msg_"));
        assert!(name.ends_with("_C123.json"));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<b>fish & chips</b> 🐟"));
        assert!(contents.contains("\n  \"source\": \"Slack\""));
        assert!(contents.ends_with("}\n"));

        let parsed: MessageRecord = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.text, record.text);
        assert_eq!(parsed.metadata, record.metadata);
    }

    #[test]
    fn same_instant_and_title_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(dir.path());
        let at = Utc::now();

        let first = store.save(&message("D9", "one"), at).unwrap();
        let second = store.save(&message("D9", "two"), at).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}

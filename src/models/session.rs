//! Session data models: the transient sample, the open session and the
//! persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Category;

use super::text::clean;
use super::timestamp;

/// One point-in-time observation of the foreground window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub application: String,
    pub window_title: String,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(
        application: impl Into<String>,
        window_title: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            application: application.into(),
            window_title: window_title.into(),
            timestamp,
        }
    }
}

/// The currently open session. Fields hold raw sampled values; normalization
/// only happens when it is finalized into a [`SessionRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub application: String,
    pub window_title: String,
    pub category: Category,
    pub started_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn open(sample: Sample, category: Category, started_at: DateTime<Utc>) -> Self {
        Self {
            application: sample.application,
            window_title: sample.window_title,
            category,
            started_at,
        }
    }

    /// Exact comparison on raw application, title and category.
    pub fn same_activity(&self, sample: &Sample, category: Category) -> bool {
        self.application == sample.application
            && self.window_title == sample.window_title
            && self.category == category
    }

    pub fn finalize(&self, ended_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            start: self.started_at,
            end: ended_at,
            application: clean(&self.application),
            window_title: clean(&self.window_title),
            category: clean(self.category.label()),
            duration_seconds: rounded_seconds(self.started_at, ended_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(with = "timestamp::rfc3339_seconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "timestamp::rfc3339_seconds")]
    pub end: DateTime<Utc>,
    pub application: String,
    pub window_title: String,
    pub category: String,
    pub duration_seconds: u64,
}

/// `end - start` rounded half away from zero to whole seconds, clamped at
/// zero when the clock went backwards.
pub fn rounded_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let elapsed_ms = (end - start).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }
    ((elapsed_ms as u64) + 500) / 1000
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

pub const META_CHANNEL_ID: &str = "channelId";
pub const META_THREAD_TS: &str = "threadTs";
pub const META_USER_ID: &str = "userId";
pub const META_TS: &str = "ts";

/// A captured chat message, written as its own file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// When the message was ingested, not when it was posted.
    #[serde(with = "timestamp::rfc3339_seconds")]
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

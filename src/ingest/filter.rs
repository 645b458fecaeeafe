use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::message::{META_CHANNEL_ID, META_THREAD_TS, META_TS, META_USER_ID};
use crate::models::MessageRecord;

use super::event::MessageEvent;

pub const SOURCE_SLACK: &str = "Slack";
pub const DIRECTION_SENT: &str = "sent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Edits, joins, bot posts and other non-original messages.
    Subtype,
    EmptyText,
    ForeignAuthor,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Subtype => "subtype",
            DropReason::EmptyText => "empty text",
            DropReason::ForeignAuthor => "not self",
        }
    }
}

/// Decides which message events are kept and turns them into records.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    /// Only this author's messages are kept. `None` keeps every author.
    pub self_user_id: Option<String>,
    /// Keep every author regardless of `self_user_id`.
    pub capture_all: bool,
}

impl MessageFilter {
    pub fn new(self_user_id: impl Into<String>, capture_all: bool) -> Self {
        Self {
            self_user_id: Some(self_user_id.into()),
            capture_all,
        }
    }

    pub fn admit(&self, event: &MessageEvent) -> Result<(), DropReason> {
        if event.subtype.as_deref().is_some_and(|s| !s.is_empty()) {
            return Err(DropReason::Subtype);
        }
        if event.text.trim().is_empty() {
            return Err(DropReason::EmptyText);
        }
        if !self.capture_all && !self.is_self(event) {
            return Err(DropReason::ForeignAuthor);
        }
        Ok(())
    }

    fn is_self(&self, event: &MessageEvent) -> bool {
        match &self.self_user_id {
            Some(id) => event.user == *id,
            None => true,
        }
    }

    pub fn to_record(&self, event: &MessageEvent, ingested_at: DateTime<Utc>) -> MessageRecord {
        let direction = match &self.self_user_id {
            Some(id) if event.user == *id => Some(DIRECTION_SENT.to_string()),
            _ => None,
        };

        let metadata = BTreeMap::from([
            (META_CHANNEL_ID.to_string(), event.channel.clone()),
            (
                META_THREAD_TS.to_string(),
                event.thread_ts.clone().unwrap_or_default(),
            ),
            (META_USER_ID.to_string(), event.user.clone()),
            (META_TS.to_string(), event.ts.clone()),
        ]);

        MessageRecord {
            timestamp: ingested_at,
            source: SOURCE_SLACK.to_string(),
            direction,
            title: event.channel.clone(),
            text: event.text.clone(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(user: &str, text: &str) -> MessageEvent {
        MessageEvent {
            subtype: None,
            user: user.into(),
            channel: "C42".into(),
            text: text.into(),
            ts: "1700000000.000200".into(),
            thread_ts: Some("1700000000.000100".into()),
        }
    }

    #[test]
    fn drops_subtypes() {
        let filter = MessageFilter::new("U1", false);
        let mut edited = event("U1", "fixed typo");
        edited.subtype = Some("message_changed".into());
        assert_eq!(filter.admit(&edited), Err(DropReason::Subtype));

        edited.subtype = Some(String::new());
        assert_eq!(filter.admit(&edited), Ok(()));
    }

    #[test]
    fn drops_blank_text() {
        let filter = MessageFilter::new("U1", true);
        assert_eq!(filter.admit(&event("U1", "")), Err(DropReason::EmptyText));
        assert_eq!(filter.admit(&event("U1", " \n\t")), Err(DropReason::EmptyText));
    }

    #[test]
    fn author_filter_and_capture_all() {
        let strict = MessageFilter::new("U1", false);
        assert_eq!(strict.admit(&event("U2", "hello")), Err(DropReason::ForeignAuthor));
        assert_eq!(strict.admit(&event("U1", "hello")), Ok(()));

        let all = MessageFilter::new("U1", true);
        assert_eq!(all.admit(&event("U2", "hello")), Ok(()));

        let unfiltered = MessageFilter::default();
        assert_eq!(unfiltered.admit(&event("U9", "hello")), Ok(()));
    }

    #[test]
    fn record_carries_origin_metadata() {
        let filter = MessageFilter::new("U1", true);
        let now = Utc::now();

        let own = filter.to_record(&event("U1", "ship it"), now);
        assert_eq!(own.source, "Slack");
        assert_eq!(own.direction.as_deref(), Some("sent"));
        assert_eq!(own.title, "C42");
        assert_eq!(own.text, "ship it");
        assert_eq!(own.timestamp, now);
        assert_eq!(own.metadata["channelId"], "C42");
        assert_eq!(own.metadata["threadTs"], "1700000000.000100");
        assert_eq!(own.metadata["userId"], "U1");
        assert_eq!(own.metadata["ts"], "1700000000.000200");

        let theirs = filter.to_record(&event("U2", "ok"), now);
        assert_eq!(theirs.direction, None);
    }
}

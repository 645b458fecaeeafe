use chrono::{DateTime, Utc};

use crate::classify::{self, Category};
use crate::models::{ActiveSession, Sample, SessionRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Active(ActiveSession),
}

impl Default for TrackerState {
    fn default() -> Self {
        TrackerState::Idle
    }
}

/// Turns a stream of samples into finalized session records.
///
/// At most one session is open at a time. A record is produced only when the
/// application, title or category changes, or when the tracker is closed.
#[derive(Debug, Default)]
pub struct SessionTracker {
    state: TrackerState,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            TrackerState::Active(session) => Some(session),
            TrackerState::Idle => None,
        }
    }

    /// Classify `sample` and feed it to the state machine.
    pub fn observe(&mut self, sample: Sample, now: DateTime<Utc>) -> Option<SessionRecord> {
        let category = classify::classify(&sample.application, &sample.window_title);
        self.observe_classified(sample, category, now)
    }

    /// Feed a sample whose category is already known.
    pub fn observe_classified(
        &mut self,
        sample: Sample,
        category: Category,
        now: DateTime<Utc>,
    ) -> Option<SessionRecord> {
        match &self.state {
            TrackerState::Active(current) if current.same_activity(&sample, category) => None,
            TrackerState::Active(current) => {
                let finished = current.finalize(now);
                self.state = TrackerState::Active(ActiveSession::open(sample, category, now));
                Some(finished)
            }
            TrackerState::Idle => {
                self.state = TrackerState::Active(ActiveSession::open(sample, category, now));
                None
            }
        }
    }

    /// Finalize the open session at `now`, leaving the tracker idle.
    /// Returns `None` when nothing was open, so repeated calls emit nothing.
    pub fn close(&mut self, now: DateTime<Utc>) -> Option<SessionRecord> {
        match std::mem::take(&mut self.state) {
            TrackerState::Active(current) => Some(current.finalize(now)),
            TrackerState::Idle => None,
        }
    }
}

mod state;

pub use state::{SessionTracker, TrackerState};

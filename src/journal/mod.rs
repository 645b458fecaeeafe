pub mod array_writer;
pub mod message_store;

pub use array_writer::{JsonArrayWriter, SyncSink};
pub use message_store::MessageStore;

use std::fs::File;

/// The per-run session container.
pub type SessionLog = JsonArrayWriter<File>;

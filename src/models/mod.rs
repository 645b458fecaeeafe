pub mod message;
pub mod session;
pub mod text;
pub mod timestamp;

pub use message::MessageRecord;
pub use session::{ActiveSession, Sample, SessionRecord};
pub use text::clean;

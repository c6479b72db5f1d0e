mod manager;

pub use manager::{EventSender, StreamManager};

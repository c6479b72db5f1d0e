pub mod batch;
pub mod config;
pub mod error;
pub mod handlers;
pub mod store;
pub mod stream;

pub use batch::{BatchConfig, BatchDispatcher, BatchGrouper, GroupingStrategy};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::{MemoryStore, NotificationStore};
pub use stream::StreamManager;

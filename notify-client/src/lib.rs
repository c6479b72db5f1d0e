//! Client-side real-time notification delivery for the service desk.
//!
//! A [`NotificationHub`] owns one connection to the notification service:
//! it prefers the SSE push stream, falls back to polling after repeated
//! push failures, and maintains a bounded in-memory cache of the most
//! recent notifications together with a derived unread count. The
//! presentation layer reads snapshots and issues mark-read intents; it
//! never mutates the cache directly.

pub mod cache;
pub mod error;
pub mod supervisor;
pub mod transport;
pub mod view;

pub use cache::NotificationCache;
pub use error::{ClientError, ClientResult};
pub use supervisor::{ConnectionState, HubConfig, Mode, NotificationHub};
pub use transport::{HttpTransport, Transport};

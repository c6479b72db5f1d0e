//! Shared notification data model and wire types for the service-desk
//! notification pipeline. Used by both `notify-service` (server) and
//! `notify-client` (client library).

pub mod model;
pub mod wire;

pub use model::{Notification, NotificationKind, Priority};
pub use wire::{ApiResponse, CreateNotificationRequest, MarkReadRequest, StreamEvent, UnreadFeed};

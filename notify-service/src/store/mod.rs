//! Notification persistence seam.
//!
//! The rest of the service only sees the [`NotificationStore`] trait; the
//! bundled implementation is in-memory. A database-backed store slots in
//! behind the same trait.

mod memory;

pub use memory::MemoryStore;

use crate::error::AppResult;
use async_trait::async_trait;
use notify_types::{Notification, UnreadFeed};
use uuid::Uuid;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a notification for its recipient.
    async fn insert(&self, notification: Notification) -> AppResult<()>;

    /// Most recent notifications for a user, newest first.
    async fn recent_for(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<Notification>>;

    /// The unread-fetch payload: recent notifications plus unread counts.
    async fn unread_feed(&self, user_id: Uuid, limit: usize) -> AppResult<UnreadFeed>;

    /// Mark the given notifications read; returns how many flipped.
    async fn mark_read(&self, user_id: Uuid, ids: &[Uuid]) -> AppResult<usize>;

    /// Mark everything read for a user; returns how many flipped.
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<usize>;
}

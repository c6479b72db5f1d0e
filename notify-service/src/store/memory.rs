use super::NotificationStore;
use crate::error::AppResult;
use async_trait::async_trait;
use notify_types::{Notification, UnreadFeed};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory notification store: per-user lists, newest first, bounded by a
/// retention cap.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Uuid, Vec<Notification>>>>,
    retention: usize,
}

impl MemoryStore {
    pub fn new(retention: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            retention: retention.max(1),
        }
    }
}

fn newest_first(a: &Notification, b: &Notification) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, notification: Notification) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let list = inner.entry(notification.recipient_id).or_default();
        if let Some(pos) = list.iter().position(|n| n.id == notification.id) {
            list.remove(pos);
        }
        let pos = list.partition_point(|n| newest_first(n, &notification).is_lt());
        list.insert(pos, notification);
        list.truncate(self.retention);
        Ok(())
    }

    async fn recent_for(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<Notification>> {
        let inner = self.inner.read().await;
        Ok(inner
            .get(&user_id)
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn unread_feed(&self, user_id: Uuid, limit: usize) -> AppResult<UnreadFeed> {
        let inner = self.inner.read().await;
        let Some(list) = inner.get(&user_id) else {
            return Ok(UnreadFeed::default());
        };

        let mut count_by_kind: HashMap<String, usize> = HashMap::new();
        let mut unread_count = 0;
        for n in list.iter().filter(|n| !n.is_read) {
            unread_count += 1;
            *count_by_kind.entry(n.kind.as_str().to_string()).or_insert(0) += 1;
        }

        Ok(UnreadFeed {
            notifications: list.iter().take(limit).cloned().collect(),
            unread_count,
            count_by_kind,
        })
    }

    async fn mark_read(&self, user_id: Uuid, ids: &[Uuid]) -> AppResult<usize> {
        let mut inner = self.inner.write().await;
        let Some(list) = inner.get_mut(&user_id) else {
            return Ok(0);
        };
        let mut flipped = 0;
        for n in list.iter_mut() {
            if !n.is_read && ids.contains(&n.id) {
                n.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<usize> {
        let mut inner = self.inner.write().await;
        let Some(list) = inner.get_mut(&user_id) else {
            return Ok(0);
        };
        let mut flipped = 0;
        for n in list.iter_mut() {
            if !n.is_read {
                n.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }
}

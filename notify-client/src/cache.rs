//! Bounded, ordered client-side notification cache.
//!
//! Entries are kept in descending `created_at` order; entries with the same
//! timestamp are ordered by descending `id` so eviction stays deterministic.
//! The unread count is always recomputed by counting, never tracked as a
//! separate counter, so it cannot drift from the cache contents.

use chrono::{DateTime, Duration, Utc};
use notify_types::{Notification, UnreadFeed};
use std::cmp::Ordering;
use std::collections::HashSet;
use uuid::Uuid;

/// Default maximum number of cached notifications.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug)]
pub struct NotificationCache {
    entries: Vec<Notification>,
    capacity: usize,
}

/// Newest first; `id` is the tie-break so ordering is total.
fn ordering(a: &Notification, b: &Notification) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

impl NotificationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    /// Snapshot of the cache contents, newest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.clone()
    }

    /// Count of unread entries, recomputed on every call.
    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.is_read).count()
    }

    /// Insert or replace by id, keeping order and evicting beyond capacity.
    pub fn upsert(&mut self, notification: Notification) {
        if let Some(pos) = self.entries.iter().position(|n| n.id == notification.id) {
            self.entries.remove(pos);
        }
        let pos = self
            .entries
            .partition_point(|n| ordering(n, &notification) == Ordering::Less);
        self.entries.insert(pos, notification);
        self.entries.truncate(self.capacity);
    }

    /// Merge a poll/refresh response into the cache.
    ///
    /// Every returned notification is upserted. Cached entries the feed did
    /// not return survive only while younger than `stale_cutoff`; the feed is
    /// authoritative for anything older.
    pub fn merge_feed(&mut self, feed: &UnreadFeed, now: DateTime<Utc>, stale_cutoff: Duration) {
        let returned: HashSet<Uuid> = feed.notifications.iter().map(|n| n.id).collect();
        self.entries
            .retain(|n| returned.contains(&n.id) || now - n.created_at <= stale_cutoff);
        for n in &feed.notifications {
            self.upsert(n.clone());
        }
    }

    /// Set the read flag of one entry, returning its prior value for rollback.
    /// `None` means the entry is not cached.
    pub fn set_read(&mut self, id: Uuid, is_read: bool) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|n| n.id == id)?;
        let prior = entry.is_read;
        entry.is_read = is_read;
        Some(prior)
    }

    /// Mark every entry read, returning the prior flags for rollback.
    pub fn set_all_read(&mut self) -> Vec<(Uuid, bool)> {
        let snapshot = self.entries.iter().map(|n| (n.id, n.is_read)).collect();
        for entry in &mut self.entries {
            entry.is_read = true;
        }
        snapshot
    }

    /// Restore read flags captured by [`set_all_read`](Self::set_all_read).
    pub fn restore_read_flags(&mut self, flags: &[(Uuid, bool)]) {
        for (id, was_read) in flags {
            self.set_read(*id, *was_read);
        }
    }
}

impl Default for NotificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_types::NotificationKind;

    fn entry(created_at: DateTime<Utc>, is_read: bool) -> Notification {
        let mut n = Notification::new(
            Uuid::new_v4(),
            NotificationKind::TicketUpdated,
            "Ticket updated",
            "Status changed",
        );
        n.created_at = created_at;
        n.is_read = is_read;
        n
    }

    #[test]
    fn test_order_is_newest_first() {
        let mut cache = NotificationCache::default();
        let t0 = Utc::now();
        let old = entry(t0 - Duration::minutes(5), false);
        let new = entry(t0, false);
        cache.upsert(old.clone());
        cache.upsert(new.clone());

        let snap = cache.snapshot();
        assert_eq!(snap[0].id, new.id);
        assert_eq!(snap[1].id, old.id);
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let t = Utc::now();
        let a = entry(t, false);
        let b = entry(t, false);

        let mut forward = NotificationCache::default();
        forward.upsert(a.clone());
        forward.upsert(b.clone());

        let mut reverse = NotificationCache::default();
        reverse.upsert(b.clone());
        reverse.upsert(a.clone());

        let f: Vec<Uuid> = forward.snapshot().iter().map(|n| n.id).collect();
        let r: Vec<Uuid> = reverse.snapshot().iter().map(|n| n.id).collect();
        assert_eq!(f, r);
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut cache = NotificationCache::default();
        let mut n = entry(Utc::now(), false);
        cache.upsert(n.clone());

        n.is_read = true;
        cache.upsert(n.clone());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.unread_count(), 0);
    }

    #[test]
    fn test_eviction_drops_oldest_at_capacity() {
        let mut cache = NotificationCache::new(100);
        let t0 = Utc::now() - Duration::hours(2);
        let oldest = entry(t0, false);
        cache.upsert(oldest.clone());
        for i in 1..100 {
            cache.upsert(entry(t0 + Duration::seconds(i), false));
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.unread_count(), 100);

        // A newer event evicts exactly the oldest entry.
        let newest = entry(Utc::now(), false);
        cache.upsert(newest.clone());

        assert_eq!(cache.len(), 100);
        assert!(cache.get(oldest.id).is_none());
        assert!(cache.get(newest.id).is_some());
        assert_eq!(cache.unread_count(), 100);
    }

    #[test]
    fn test_unread_count_recomputed_after_mutations() {
        let mut cache = NotificationCache::default();
        let a = entry(Utc::now(), false);
        let b = entry(Utc::now(), true);
        cache.upsert(a.clone());
        cache.upsert(b.clone());
        assert_eq!(cache.unread_count(), 1);

        let prior = cache.set_read(a.id, true);
        assert_eq!(prior, Some(false));
        assert_eq!(cache.unread_count(), 0);

        cache.set_read(a.id, false);
        assert_eq!(cache.unread_count(), 1);
    }

    #[test]
    fn test_set_all_read_and_restore() {
        let mut cache = NotificationCache::default();
        let a = entry(Utc::now(), false);
        let b = entry(Utc::now(), true);
        cache.upsert(a.clone());
        cache.upsert(b.clone());

        let flags = cache.set_all_read();
        assert_eq!(cache.unread_count(), 0);

        cache.restore_read_flags(&flags);
        assert_eq!(cache.unread_count(), 1);
        assert_eq!(cache.get(a.id).map(|n| n.is_read), Some(false));
        assert_eq!(cache.get(b.id).map(|n| n.is_read), Some(true));
    }

    #[test]
    fn test_merge_feed_keeps_fresh_unreturned_entries() {
        let mut cache = NotificationCache::default();
        let now = Utc::now();
        let fresh = entry(now - Duration::hours(1), false);
        let stale = entry(now - Duration::hours(30), false);
        cache.upsert(fresh.clone());
        cache.upsert(stale.clone());

        let served = entry(now, false);
        let feed = UnreadFeed {
            notifications: vec![served.clone()],
            unread_count: 1,
            count_by_kind: Default::default(),
        };
        cache.merge_feed(&feed, now, Duration::hours(24));

        assert!(cache.get(served.id).is_some());
        assert!(cache.get(fresh.id).is_some());
        assert!(cache.get(stale.id).is_none());
    }

    #[test]
    fn test_merge_feed_overwrites_overlapping_entries() {
        let mut cache = NotificationCache::default();
        let now = Utc::now();
        let mut n = entry(now, false);
        cache.upsert(n.clone());

        n.is_read = true;
        let feed = UnreadFeed {
            notifications: vec![n.clone()],
            unread_count: 0,
            count_by_kind: Default::default(),
        };
        cache.merge_feed(&feed, now, Duration::hours(24));

        assert_eq!(cache.unread_count(), 0);
        assert_eq!(cache.len(), 1);
    }
}

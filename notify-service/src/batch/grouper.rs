use super::GroupingStrategy;
use chrono::Utc;
use notify_types::{Notification, Priority};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Immutable parameters for one batching family. Loaded at startup;
/// never changes during a batching cycle.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch_key: String,
    /// A group flushes the moment it reaches this size
    pub max_batch_size: usize,
    /// A group flushes once its oldest pending item is this old
    pub max_wait_time: Duration,
    pub strategy: GroupingStrategy,
}

impl BatchConfig {
    pub fn new(
        batch_key: impl Into<String>,
        max_batch_size: usize,
        max_wait_time: Duration,
        strategy: GroupingStrategy,
    ) -> Self {
        Self {
            batch_key: batch_key.into(),
            max_batch_size: max_batch_size.max(1),
            max_wait_time,
            strategy,
        }
    }
}

/// One flushed group: a single delivery summarizing its members.
#[derive(Debug, Clone)]
pub struct GroupedDelivery {
    pub batch_key: String,
    pub group_key: String,
    pub notifications: Vec<Notification>,
}

impl GroupedDelivery {
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Distinct recipients across the group.
    pub fn recipients(&self) -> Vec<Uuid> {
        let mut seen = Vec::new();
        for n in &self.notifications {
            if !seen.contains(&n.recipient_id) {
                seen.push(n.recipient_id);
            }
        }
        seen
    }

    /// The single notification delivered for this group. A one-item group
    /// passes its notification through unchanged; larger groups get one
    /// summary bundling the members.
    pub fn summary(&self) -> Option<Notification> {
        let first = self.notifications.first()?;
        if self.notifications.len() == 1 {
            return Some(first.clone());
        }

        let newest = self
            .notifications
            .iter()
            .map(|n| n.created_at)
            .max()
            .unwrap_or_else(Utc::now);
        let priority = self
            .notifications
            .iter()
            .map(|n| n.priority)
            .max()
            .unwrap_or(Priority::Normal);
        let titles: Vec<&str> = self
            .notifications
            .iter()
            .take(3)
            .map(|n| n.title.as_str())
            .collect();
        let mut message = titles.join(", ");
        if self.notifications.len() > 3 {
            message.push_str(", …");
        }
        let ids: Vec<String> = self.notifications.iter().map(|n| n.id.to_string()).collect();

        let mut summary = Notification::new(
            first.recipient_id,
            first.kind,
            format!("{} new notifications", self.notifications.len()),
            message,
        )
        .with_priority(priority)
        .with_metadata(serde_json::json!({
            "bundled_ids": ids,
            "batch_key": self.batch_key,
            "group_key": self.group_key,
        }));
        summary.created_at = newest;
        Some(summary)
    }
}

#[derive(Debug)]
struct Accumulator {
    notifications: Vec<Notification>,
    oldest_at: Instant,
}

impl Accumulator {
    fn new(now: Instant) -> Self {
        Self {
            notifications: Vec::new(),
            oldest_at: now,
        }
    }
}

/// Accumulates notifications for one batch key, partitioned by the
/// strategy's group key. Not internally synchronized; callers serialize
/// access per batch key (see `BatchDispatcher`).
#[derive(Debug)]
pub struct BatchGrouper {
    config: BatchConfig,
    groups: HashMap<String, Accumulator>,
}

impl BatchGrouper {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            groups: HashMap::new(),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Total notifications waiting across all groups.
    pub fn pending(&self) -> usize {
        self.groups.values().map(|a| a.notifications.len()).sum()
    }

    /// Add a notification; returns the flushed group if this insertion
    /// reached the size bound. Flushing resets that group only.
    pub fn offer(&mut self, notification: Notification) -> Option<GroupedDelivery> {
        let key = self.config.strategy.group_key(&notification);
        let acc = self
            .groups
            .entry(key.clone())
            .or_insert_with(|| Accumulator::new(Instant::now()));
        if acc.notifications.is_empty() {
            acc.oldest_at = Instant::now();
        }
        acc.notifications.push(notification);

        if acc.notifications.len() >= self.config.max_batch_size {
            self.flush_group(&key)
        } else {
            None
        }
    }

    /// Flush every group whose oldest pending item has waited at least
    /// `max_wait_time` as of `now`.
    pub fn take_expired(&mut self, now: Instant) -> Vec<GroupedDelivery> {
        let expired: Vec<String> = self
            .groups
            .iter()
            .filter(|(_, acc)| {
                !acc.notifications.is_empty()
                    && now.duration_since(acc.oldest_at) >= self.config.max_wait_time
            })
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .iter()
            .filter_map(|key| self.flush_group(key))
            .collect()
    }

    fn flush_group(&mut self, key: &str) -> Option<GroupedDelivery> {
        let acc = self.groups.remove(key)?;
        if acc.notifications.is_empty() {
            return None;
        }
        Some(GroupedDelivery {
            batch_key: self.config.batch_key.clone(),
            group_key: key.to_string(),
            notifications: acc.notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_types::NotificationKind;

    fn config(max_batch_size: usize, max_wait_time: Duration) -> BatchConfig {
        BatchConfig::new("ticket", max_batch_size, max_wait_time, GroupingStrategy::ByKind)
    }

    fn notification(kind: NotificationKind) -> Notification {
        Notification::new(Uuid::new_v4(), kind, "Ticket updated", "Status changed")
    }

    #[test]
    fn test_flush_on_size_bound() {
        let mut grouper = BatchGrouper::new(config(5, Duration::from_secs(60)));

        for _ in 0..4 {
            assert!(grouper
                .offer(notification(NotificationKind::TicketUpdated))
                .is_none());
        }
        assert_eq!(grouper.pending(), 4);

        // The fifth insertion flushes immediately as one grouped delivery.
        let delivery = grouper
            .offer(notification(NotificationKind::TicketUpdated))
            .expect("size bound reached");
        assert_eq!(delivery.len(), 5);
        assert_eq!(delivery.group_key, "ticket_updated");

        // The accumulator for that group is reset.
        assert_eq!(grouper.pending(), 0);
        assert!(grouper
            .offer(notification(NotificationKind::TicketUpdated))
            .is_none());
    }

    #[test]
    fn test_flush_resets_only_that_group() {
        let mut grouper = BatchGrouper::new(config(2, Duration::from_secs(60)));
        grouper.offer(notification(NotificationKind::CommentAdded));
        grouper.offer(notification(NotificationKind::TicketUpdated));

        let delivery = grouper
            .offer(notification(NotificationKind::TicketUpdated))
            .expect("ticket_updated group is full");
        assert_eq!(delivery.group_key, "ticket_updated");

        // comment_added is still pending.
        assert_eq!(grouper.pending(), 1);
    }

    #[test]
    fn test_take_expired_flushes_old_groups() {
        let mut grouper = BatchGrouper::new(config(100, Duration::from_millis(50)));
        grouper.offer(notification(NotificationKind::SlaWarning));

        // Not yet expired.
        assert!(grouper.take_expired(Instant::now()).is_empty());

        let later = Instant::now() + Duration::from_millis(100);
        let deliveries = grouper.take_expired(later);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].len(), 1);
        assert_eq!(grouper.pending(), 0);
    }

    #[test]
    fn test_single_item_summary_passes_through() {
        let n = notification(NotificationKind::SlaBreach);
        let delivery = GroupedDelivery {
            batch_key: "sla".to_string(),
            group_key: "sla_breach".to_string(),
            notifications: vec![n.clone()],
        };
        assert_eq!(delivery.summary().unwrap(), n);
    }

    #[test]
    fn test_multi_item_summary_bundles() {
        let user = Uuid::new_v4();
        let mut notifications = Vec::new();
        for i in 0..4 {
            let mut n = Notification::new(
                user,
                NotificationKind::TicketUpdated,
                format!("Update {i}"),
                "Status changed",
            );
            if i == 2 {
                n.priority = Priority::High;
            }
            notifications.push(n);
        }
        let delivery = GroupedDelivery {
            batch_key: "ticket".to_string(),
            group_key: "ticket_updated".to_string(),
            notifications,
        };

        let summary = delivery.summary().unwrap();
        assert_eq!(summary.title, "4 new notifications");
        assert!(summary.message.ends_with(", …"));
        assert_eq!(summary.priority, Priority::High);
        let bundled = summary
            .metadata
            .as_ref()
            .and_then(|m| m.get("bundled_ids"))
            .and_then(|v| v.as_array())
            .map(|a| a.len());
        assert_eq!(bundled, Some(4));
        assert_eq!(delivery.recipients(), vec![user]);
    }
}

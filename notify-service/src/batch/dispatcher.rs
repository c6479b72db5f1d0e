use super::{BatchConfig, BatchGrouper, GroupedDelivery};
use crate::stream::StreamManager;
use notify_types::{Notification, Priority, StreamEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Routes created notifications into batch accumulators and forwards
/// flushed groups to the push stream.
///
/// High-priority notifications bypass batching entirely. Each batch key
/// owns one grouper behind its own mutex, so size/wait checks for a
/// `(batch_key, group_key)` pair are serialized even under concurrent
/// submissions.
pub struct BatchDispatcher {
    groupers: HashMap<String, Mutex<BatchGrouper>>,
    stream: Arc<StreamManager>,
}

impl BatchDispatcher {
    pub fn new(configs: Vec<BatchConfig>, stream: Arc<StreamManager>) -> Self {
        let groupers = configs
            .into_iter()
            .map(|c| (c.batch_key.clone(), Mutex::new(BatchGrouper::new(c))))
            .collect();
        Self { groupers, stream }
    }

    /// The batch family a notification belongs to.
    fn batch_key_for(notification: &Notification) -> &'static str {
        notification.kind.category()
    }

    /// Accept a notification for delivery: immediate for high priority or
    /// unconfigured families, batched otherwise.
    pub async fn submit(&self, notification: Notification) {
        if notification.priority == Priority::High {
            debug!(id = %notification.id, "high priority, bypassing batch");
            self.deliver_single(notification).await;
            return;
        }

        let key = Self::batch_key_for(&notification);
        match self.groupers.get(key) {
            Some(grouper) => {
                let flushed = grouper.lock().await.offer(notification);
                if let Some(delivery) = flushed {
                    self.deliver(delivery).await;
                }
            }
            None => self.deliver_single(notification).await,
        }
    }

    /// Flush every group past its wait bound, across all batch keys.
    pub async fn flush_expired(&self) {
        let now = Instant::now();
        for grouper in self.groupers.values() {
            let deliveries = grouper.lock().await.take_expired(now);
            for delivery in deliveries {
                self.deliver(delivery).await;
            }
        }
    }

    /// Total notifications currently waiting in accumulators.
    pub async fn pending(&self) -> usize {
        let mut total = 0;
        for grouper in self.groupers.values() {
            total += grouper.lock().await.pending();
        }
        total
    }

    async fn deliver(&self, delivery: GroupedDelivery) {
        let Some(summary) = delivery.summary() else {
            return;
        };
        info!(
            batch_key = %delivery.batch_key,
            group_key = %delivery.group_key,
            bundled = delivery.len(),
            "flushing grouped delivery"
        );
        for recipient in delivery.recipients() {
            let mut event = summary.clone();
            event.recipient_id = recipient;
            self.stream
                .send_to_user(recipient, StreamEvent::notification(event))
                .await;
        }
    }

    async fn deliver_single(&self, notification: Notification) {
        self.stream
            .send_to_user(
                notification.recipient_id,
                StreamEvent::notification(notification),
            )
            .await;
    }

    /// Periodic expiry sweep; the handle lives as long as the server.
    pub fn spawn_flush_task(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                self.flush_expired().await;
            }
        })
    }
}

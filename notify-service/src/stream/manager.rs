//! SSE connection manager.
//!
//! Tracks the active push-stream subscriptions per user and routes stream
//! events to them. A user can hold several concurrent subscriptions (tabs),
//! and re-opening the stream is just another subscription, so client-side
//! retries are idempotent. Senders whose receiver has gone away are pruned
//! on the next delivery.

use notify_types::StreamEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

pub type EventSender = mpsc::UnboundedSender<StreamEvent>;

#[derive(Clone)]
pub struct StreamManager {
    connections: Arc<RwLock<HashMap<Uuid, Vec<EventSender>>>>,
    server_id: String,
}

impl StreamManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            server_id: Uuid::new_v4().to_string(),
        }
    }

    /// Open a subscription for a user. The returned receiver backs one SSE
    /// response body; a `Connected` event is queued immediately.
    pub async fn subscribe(&self, user_id: Uuid) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(StreamEvent::connected(self.server_id.clone()));
        self.connections
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(tx);
        debug!(%user_id, "stream subscription opened");
        rx
    }

    /// Drop every subscription for a user.
    pub async fn unsubscribe_all(&self, user_id: Uuid) {
        self.connections.write().await.remove(&user_id);
    }

    /// Deliver an event to every live subscription of one user, pruning
    /// subscriptions whose receiver is gone.
    pub async fn send_to_user(&self, user_id: Uuid, event: StreamEvent) {
        let mut connections = self.connections.write().await;
        if let Some(senders) = connections.get_mut(&user_id) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                connections.remove(&user_id);
            }
        }
    }

    /// Deliver an event to every connected user.
    pub async fn broadcast(&self, event: StreamEvent) {
        let mut connections = self.connections.write().await;
        connections.retain(|_, senders| {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            !senders.is_empty()
        });
    }

    /// Broadcast one heartbeat to every open stream.
    pub async fn heartbeat_all(&self) {
        self.broadcast(StreamEvent::heartbeat()).await;
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        self.connections
            .read()
            .await
            .get(&user_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub async fn total_connections(&self) -> usize {
        self.connections.read().await.values().map(|v| v.len()).sum()
    }

    pub async fn connected_users_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Periodic heartbeat loop; the handle lives as long as the server.
    pub fn spawn_heartbeat_task(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                self.heartbeat_all().await;
            }
        })
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

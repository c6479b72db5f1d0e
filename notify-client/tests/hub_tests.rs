//! End-to-end tests for the notification hub against a mock transport.

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use notify_client::transport::EventStream;
use notify_client::{ClientError, ClientResult, HubConfig, Mode, NotificationHub, Transport};
use notify_types::{MarkReadRequest, Notification, NotificationKind, StreamEvent, UnreadFeed};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct MockTransport {
    /// Taken by the first `open_stream`; later opens fail.
    stream: Mutex<Option<mpsc::UnboundedReceiver<ClientResult<StreamEvent>>>>,
    feed: Mutex<UnreadFeed>,
    hang_fetch: AtomicBool,
    fail_mark_read: AtomicBool,
    mark_read_calls: Mutex<Vec<MarkReadRequest>>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn with_stream(&self) -> mpsc::UnboundedSender<ClientResult<StreamEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.stream.lock().await = Some(rx);
        tx
    }

    async fn set_feed(&self, notifications: Vec<Notification>) {
        let unread_count = notifications.iter().filter(|n| !n.is_read).count();
        *self.feed.lock().await = UnreadFeed {
            notifications,
            unread_count,
            count_by_kind: Default::default(),
        };
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open_stream(&self) -> ClientResult<EventStream> {
        match self.stream.lock().await.take() {
            Some(rx) => {
                let stream = futures::stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                });
                Ok(stream.boxed())
            }
            None => Err(ClientError::Transport("connection refused".to_string())),
        }
    }

    async fn fetch_unread(&self) -> ClientResult<UnreadFeed> {
        if self.hang_fetch.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        Ok(self.feed.lock().await.clone())
    }

    async fn mark_read(&self, request: &MarkReadRequest) -> ClientResult<()> {
        self.mark_read_calls.lock().await.push(request.clone());
        if self.fail_mark_read.load(Ordering::SeqCst) {
            Err(ClientError::MarkRead("backend unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn fast_config() -> HubConfig {
    HubConfig {
        poll_interval: Duration::from_secs(30),
        fetch_timeout: Duration::from_secs(10),
        push_retry_backoff: Duration::from_millis(100),
        push_idle_timeout: Duration::from_secs(5),
        ..HubConfig::default()
    }
}

fn ticket_notification(title: &str) -> Notification {
    Notification::new(
        Uuid::new_v4(),
        NotificationKind::TicketAssigned,
        title,
        "A ticket needs your attention",
    )
    .with_metadata(serde_json::json!({ "ticket_id": "42" }))
}

async fn wait_for_mode(hub: &NotificationHub, mode: Mode) {
    for _ in 0..1000 {
        if hub.mode().await == mode {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("hub never reached {mode:?}");
}

#[tokio::test(start_paused = true)]
async fn push_events_flow_into_the_cache() {
    let transport = MockTransport::new();
    let tx = transport.with_stream().await;

    let hub = NotificationHub::connect(transport.clone(), fast_config());

    tx.send(Ok(StreamEvent::connected("srv"))).unwrap();
    let n = ticket_notification("Ticket #42 assigned");
    tx.send(Ok(StreamEvent::notification(n.clone()))).unwrap();

    for _ in 0..100 {
        if hub.unread_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(hub.unread_count().await, 1);
    assert_eq!(hub.notifications().await[0].id, n.id);
    assert_eq!(hub.mode().await, Mode::Push);
    assert_eq!(hub.connection_state().await.failure_count, 0);

    hub.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn repeated_push_failures_degrade_to_poll_for_good() {
    let transport = MockTransport::new();
    // No stream installed: every open attempt fails.
    let hub = NotificationHub::connect(transport.clone(), fast_config());

    wait_for_mode(&hub, Mode::Poll).await;

    // Stays in poll across several poll intervals; no flapping back.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(hub.mode().await, Mode::Poll);

    hub.shutdown().await;
    assert_eq!(hub.mode().await, Mode::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn silent_push_stream_counts_as_failure_and_falls_back() {
    let transport = MockTransport::new();
    // The stream opens fine but never yields anything: half-open socket.
    // Keep the sender alive so the channel never closes.
    let _tx = transport.with_stream().await;

    let hub = NotificationHub::connect(transport.clone(), fast_config());

    // The idle timeout must convert silence into a push failure and the
    // usual retry-then-fallback path must run to completion.
    wait_for_mode(&hub, Mode::Poll).await;

    // Poll is terminal: the dead stream is not retried.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(hub.mode().await, Mode::Poll);

    hub.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn poll_mode_merges_the_unread_feed() {
    let transport = MockTransport::new();
    let n = ticket_notification("Ticket #42 assigned");
    transport.set_feed(vec![n.clone()]).await;

    let hub = NotificationHub::connect(transport.clone(), fast_config());
    wait_for_mode(&hub, Mode::Poll).await;

    for _ in 0..100 {
        if hub.unread_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.unread_count().await, 1);
    assert_eq!(hub.notifications().await[0].id, n.id);

    hub.shutdown().await;
}

#[tokio::test]
async fn mark_as_read_rolls_back_on_failure() {
    let transport = MockTransport::new();
    let n = ticket_notification("Ticket #42 assigned");
    transport.set_feed(vec![n.clone()]).await;

    let hub = NotificationHub::new(transport.clone(), HubConfig::default());
    hub.refresh().await;
    assert_eq!(hub.unread_count().await, 1);

    transport.fail_mark_read.store(true, Ordering::SeqCst);
    let err = hub.mark_as_read(n.id).await.unwrap_err();
    assert!(matches!(err, ClientError::MarkRead(_)));

    // Optimistic flip reverted: still unread, retryable.
    assert_eq!(hub.unread_count().await, 1);

    transport.fail_mark_read.store(false, Ordering::SeqCst);
    hub.mark_as_read(n.id).await.unwrap();
    assert_eq!(hub.unread_count().await, 0);
}

#[tokio::test]
async fn mark_all_as_read_is_idempotent_and_rolls_back() {
    let transport = MockTransport::new();
    let notifications = vec![
        ticket_notification("a"),
        ticket_notification("b"),
        ticket_notification("c"),
    ];
    transport.set_feed(notifications.clone()).await;

    let hub = NotificationHub::new(transport.clone(), HubConfig::default());
    hub.refresh().await;
    assert_eq!(hub.unread_count().await, 3);

    transport.fail_mark_read.store(true, Ordering::SeqCst);
    hub.mark_all_as_read().await.unwrap_err();
    assert_eq!(hub.unread_count().await, 3);

    transport.fail_mark_read.store(false, Ordering::SeqCst);
    hub.mark_all_as_read().await.unwrap();
    assert_eq!(hub.unread_count().await, 0);

    // Second call with no new notifications: same final state.
    hub.mark_all_as_read().await.unwrap();
    assert_eq!(hub.unread_count().await, 0);
    let calls = transport.mark_read_calls.lock().await;
    assert!(calls.iter().rev().take(2).all(|c| c.mark_all));
}

#[tokio::test(start_paused = true)]
async fn refresh_timeout_leaves_everything_untouched() {
    let transport = MockTransport::new();
    let n = ticket_notification("Ticket #42 assigned");
    transport.set_feed(vec![n.clone()]).await;

    let hub = NotificationHub::new(transport.clone(), HubConfig::default());
    hub.refresh().await;
    assert_eq!(hub.unread_count().await, 1);

    transport.hang_fetch.store(true, Ordering::SeqCst);
    let mode_before = hub.mode().await;
    hub.refresh().await; // times out internally, must not panic or mutate

    assert_eq!(hub.mode().await, mode_before);
    assert_eq!(hub.unread_count().await, 1);
    assert_eq!(hub.notifications().await[0].id, n.id);
}

#[tokio::test]
async fn open_returns_the_deep_link_without_waiting_for_mark_read() {
    let transport = MockTransport::new();
    let n = ticket_notification("Ticket #42 assigned");
    transport.set_feed(vec![n.clone()]).await;
    // Mark-read will fail, navigation must still proceed.
    transport.fail_mark_read.store(true, Ordering::SeqCst);

    let hub = NotificationHub::new(transport.clone(), HubConfig::default());
    hub.refresh().await;

    let link = hub.clone().open(n.id).await;
    assert_eq!(link, "/tickets/42");

    // Unknown ids fall back to the dashboard.
    let link = hub.clone().open(Uuid::new_v4()).await;
    assert_eq!(link, "/");
}

#[tokio::test]
async fn shutdown_rejects_further_mutations() {
    let transport = MockTransport::new();
    let n = ticket_notification("Ticket #42 assigned");
    transport.set_feed(vec![n.clone()]).await;

    let hub = NotificationHub::new(transport.clone(), HubConfig::default());
    hub.refresh().await;
    hub.shutdown().await;

    assert_eq!(hub.mode().await, Mode::Disconnected);
    assert!(matches!(
        hub.mark_as_read(n.id).await,
        Err(ClientError::Closed)
    ));

    // A refresh after teardown must not mutate the cache.
    transport.set_feed(vec![]).await;
    hub.refresh().await;
    assert_eq!(hub.notifications().await.len(), 1);
}

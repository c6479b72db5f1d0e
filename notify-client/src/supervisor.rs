//! Connection supervisor: one active transport, one cache, one owner.
//!
//! The supervisor is an explicit finite-state machine over three modes.
//! It starts on the push stream, retries it a bounded number of times, and
//! falls back to polling for the rest of the session; polling never flips
//! back to push (only a fresh hub re-attempts the stream). All cache
//! mutations go through the single `state` mutex, so a poll merge can never
//! interleave with a push event.

use crate::cache::{NotificationCache, DEFAULT_CAPACITY};
use crate::error::{ClientError, ClientResult};
use crate::transport::Transport;
use crate::view;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use notify_types::{MarkReadRequest, Notification, StreamEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Active transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Push,
    Poll,
    Disconnected,
}

/// Push-transport health, tracked alongside the cache.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    pub mode: Mode,
    /// Consecutive push failures since the last successful contact.
    pub failure_count: u32,
    pub last_contact_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            mode: Mode::Disconnected,
            failure_count: 0,
            last_contact_at: None,
        }
    }

    /// Any successful push event or heartbeat resets the failure counter.
    pub fn record_contact(&mut self) {
        self.failure_count = 0;
        self.last_contact_at = Some(Utc::now());
    }

    /// Record a push failure; past the threshold the mode degrades to poll.
    /// Poll is terminal within a session.
    pub fn record_push_failure(&mut self, threshold: u32) -> Mode {
        self.failure_count += 1;
        if self.mode == Mode::Push && self.failure_count > threshold {
            self.mode = Mode::Poll;
        }
        self.mode
    }
}

/// Tunables for a hub instance.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Poll-mode fetch interval
    pub poll_interval: Duration,
    /// Timeout for a single unread fetch
    pub fetch_timeout: Duration,
    /// Push failures tolerated before degrading to poll
    pub max_push_failures: u32,
    /// Pause between push reopen attempts
    pub push_retry_backoff: Duration,
    /// A push stream that yields nothing for this long counts as failed.
    /// Server heartbeats arrive every 25s, so a healthy stream never gets
    /// close to this.
    pub push_idle_timeout: Duration,
    /// Cache capacity
    pub cache_capacity: usize,
    /// Poll merges drop unreturned cache entries older than this
    pub merge_stale_cutoff: chrono::Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            max_push_failures: 3,
            push_retry_backoff: Duration::from_secs(1),
            push_idle_timeout: Duration::from_secs(75),
            cache_capacity: DEFAULT_CAPACITY,
            merge_stale_cutoff: chrono::Duration::hours(24),
        }
    }
}

struct HubState {
    cache: NotificationCache,
    conn: ConnectionState,
    /// Set on shutdown; no cache mutation happens afterwards.
    closed: bool,
}

/// Per-session notification context: one connection, one cache.
///
/// Construct with [`NotificationHub::connect`], tear down with
/// [`NotificationHub::shutdown`]. The presentation layer reads snapshots
/// and issues mark-read intents; it never touches the cache directly.
pub struct NotificationHub {
    state: Mutex<HubState>,
    transport: Arc<dyn Transport>,
    config: HubConfig,
    driver: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl NotificationHub {
    /// Build a hub without starting the driver task (used by tests and by
    /// callers that drive modes manually).
    pub fn new(transport: Arc<dyn Transport>, config: HubConfig) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HubState {
                cache: NotificationCache::new(config.cache_capacity),
                conn: ConnectionState::new(),
                closed: false,
            }),
            transport,
            config,
            driver: std::sync::Mutex::new(None),
        })
    }

    /// Build a hub and start delivering: push first, poll as fallback.
    pub fn connect(transport: Arc<dyn Transport>, config: HubConfig) -> Arc<Self> {
        let hub = Self::new(transport, config);
        hub.clone().start();
        hub
    }

    /// Start the driver task. Idempotent per hub: a second call replaces a
    /// finished driver but is a no-op while one is running.
    pub fn start(self: Arc<Self>) {
        let mut slot = match self.driver.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let hub = Arc::clone(&self);
        *slot = Some(tokio::spawn(async move {
            {
                let mut state = hub.state.lock().await;
                if state.closed {
                    return;
                }
                state.conn.mode = Mode::Push;
            }
            hub.drive().await;
        }));
    }

    async fn drive(&self) {
        loop {
            let mode = { self.state.lock().await.conn.mode };
            match mode {
                Mode::Push => {
                    self.push_cycle().await;
                    if self.mode().await == Mode::Push {
                        tokio::time::sleep(self.config.push_retry_backoff).await;
                    }
                }
                Mode::Poll => {
                    self.poll_once().await;
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Mode::Disconnected => return,
            }
            if self.state.lock().await.closed {
                return;
            }
        }
    }

    /// One push attempt: open the stream and consume it until it ends,
    /// errors, or goes silent past `push_idle_timeout` (a half-open
    /// connection looks exactly like a quiet one, and heartbeats guarantee
    /// a healthy stream is never quiet that long). Every exit path counts
    /// as a failure; events and heartbeats reset the counter while the
    /// stream is healthy.
    async fn push_cycle(&self) {
        match self.transport.open_stream().await {
            Ok(mut stream) => loop {
                match tokio::time::timeout(self.config.push_idle_timeout, stream.next()).await {
                    Ok(Some(Ok(event))) => {
                        if !self.apply_stream_event(event).await {
                            return;
                        }
                    }
                    Ok(Some(Err(e))) => {
                        warn!(error = %e, "push stream errored");
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            idle_secs = self.config.push_idle_timeout.as_secs(),
                            "push stream went silent"
                        );
                        break;
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to open push stream");
            }
        }
        self.record_push_failure().await;
    }

    /// Returns false once the hub is closed.
    async fn apply_stream_event(&self, event: StreamEvent) -> bool {
        let mut state = self.state.lock().await;
        if state.closed {
            return false;
        }
        state.conn.record_contact();
        if let StreamEvent::Notification { notification } = event {
            debug!(id = %notification.id, kind = notification.kind.as_str(), "push event");
            state.cache.upsert(notification);
        }
        true
    }

    async fn record_push_failure(&self) {
        let mut state = self.state.lock().await;
        if state.closed {
            return;
        }
        let mode = state
            .conn
            .record_push_failure(self.config.max_push_failures);
        if mode == Mode::Poll {
            info!(
                failures = state.conn.failure_count,
                "push transport gave up, polling for the rest of the session"
            );
        }
    }

    /// One poll-style fetch+merge. Failures and timeouts leave the cache and
    /// mode untouched; poll has no further fallback.
    async fn poll_once(&self) {
        let fetch = self.transport.fetch_unread();
        match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(feed)) => {
                let mut state = self.state.lock().await;
                if state.closed {
                    return;
                }
                state
                    .cache
                    .merge_feed(&feed, Utc::now(), self.config.merge_stale_cutoff);
                state.conn.record_contact();
            }
            Ok(Err(e)) => warn!(error = %e, "unread fetch failed"),
            Err(_) => warn!("unread fetch timed out"),
        }
    }

    /// Snapshot of cached notifications, newest first.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.cache.snapshot()
    }

    /// Unread count derived from the cache, never tracked independently.
    pub async fn unread_count(&self) -> usize {
        self.state.lock().await.cache.unread_count()
    }

    pub async fn mode(&self) -> Mode {
        self.state.lock().await.conn.mode
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.state.lock().await.conn.clone()
    }

    /// Force an immediate fetch+merge regardless of mode. Errors are logged
    /// and swallowed; refresh never breaks the session.
    pub async fn refresh(&self) {
        self.poll_once().await;
    }

    /// Optimistically mark one notification read, then tell the server.
    /// A failed request rolls the flag back and returns the error so the
    /// user can retry.
    pub async fn mark_as_read(&self, id: Uuid) -> ClientResult<()> {
        let prior = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(ClientError::Closed);
            }
            state.cache.set_read(id, true)
        };

        let request = MarkReadRequest::ids(vec![id]);
        match self.transport.mark_read(&request).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let mut state = self.state.lock().await;
                if !state.closed {
                    if let Some(was_read) = prior {
                        state.cache.set_read(id, was_read);
                    }
                }
                Err(e)
            }
        }
    }

    /// Optimistically mark everything read, then tell the server. Rollback
    /// restores each entry's prior flag on failure. Idempotent.
    pub async fn mark_all_as_read(&self) -> ClientResult<()> {
        let prior = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(ClientError::Closed);
            }
            state.cache.set_all_read()
        };

        match self.transport.mark_read(&MarkReadRequest::all()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let mut state = self.state.lock().await;
                if !state.closed {
                    state.cache.restore_read_flags(&prior);
                }
                Err(e)
            }
        }
    }

    /// Item click: return the deep link immediately and mark the entry read
    /// in the background. Navigation is never blocked on the request.
    pub async fn open(self: Arc<Self>, id: Uuid) -> String {
        let link = {
            let state = self.state.lock().await;
            state
                .cache
                .get(id)
                .map(view::link_for)
                .unwrap_or_else(|| "/".to_string())
        };
        let hub = Arc::clone(&self);
        tokio::spawn(async move {
            if let Err(e) = hub.mark_as_read(id).await {
                debug!(error = %e, %id, "background mark-read failed");
            }
        });
        link
    }

    /// Tear down: close the transport loop, stop timers, and discard the
    /// results of any in-flight requests.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock().await;
            state.closed = true;
            state.conn.mode = Mode::Disconnected;
        }
        let handle = {
            let mut slot = match self.driver.lock() {
                Ok(slot) => slot,
                Err(poisoned) => poisoned.into_inner(),
            };
            slot.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

//! Transport seam between the supervisor and the notification service.
//!
//! Two interchangeable delivery mechanisms sit behind the [`Transport`]
//! trait: the SSE push stream and the unread-fetch poll. Exactly one is
//! active at a time; the supervisor decides which.

mod http;
mod sse;

pub use http::HttpTransport;
pub use sse::SseParser;

use crate::error::ClientResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use notify_types::{MarkReadRequest, StreamEvent, UnreadFeed};

/// Stream of push events, boxed so mocks and HTTP share one shape.
pub type EventStream = BoxStream<'static, ClientResult<StreamEvent>>;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open the long-lived push stream. The server treats repeated opens as
    /// idempotent, so the supervisor is free to retry.
    async fn open_stream(&self) -> ClientResult<EventStream>;

    /// Full fetch of recent/unread notifications (poll mode and refresh).
    async fn fetch_unread(&self) -> ClientResult<UnreadFeed>;

    /// Mark the given notifications (or everything) read.
    async fn mark_read(&self, request: &MarkReadRequest) -> ClientResult<()>;
}

use super::{EventStream, SseParser, Transport};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use futures::StreamExt;
use notify_types::{ApiResponse, MarkReadRequest, StreamEvent, UnreadFeed};
use std::time::Duration;
use uuid::Uuid;

/// HTTP implementation of [`Transport`] against the notification service.
pub struct HttpTransport {
    base_url: String,
    user_id: Uuid,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, user_id: Uuid) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open_stream(&self) -> ClientResult<EventStream> {
        let response = self
            .http
            .get(self.url(&format!("/api/v1/notifications/stream/{}", self.user_id)))
            .header("Accept", "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .scan(SseParser::new(), |parser, chunk| {
                let out: Vec<ClientResult<StreamEvent>> = match chunk {
                    Ok(bytes) => parser.push(&bytes).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(futures::stream::iter(out)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }

    async fn fetch_unread(&self) -> ClientResult<UnreadFeed> {
        let response: ApiResponse<UnreadFeed> = self
            .http
            .get(self.url(&format!("/api/v1/notifications/unread/{}", self.user_id)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.data.ok_or_else(|| {
            ClientError::Protocol(
                response
                    .error
                    .unwrap_or_else(|| "empty unread-feed response".to_string()),
            )
        })
    }

    async fn mark_read(&self, request: &MarkReadRequest) -> ClientResult<()> {
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(self.url(&format!("/api/v1/notifications/read/{}", self.user_id)))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.success {
            Ok(())
        } else {
            Err(ClientError::MarkRead(
                response
                    .error
                    .unwrap_or_else(|| "server rejected mark-read".to_string()),
            ))
        }
    }
}

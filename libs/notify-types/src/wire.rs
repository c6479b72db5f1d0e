//! Wire types shared by the HTTP API and the SSE push stream.

use crate::model::Notification;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// API response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Payload of the unread-fetch endpoint, consumed by poll mode and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnreadFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub count_by_kind: HashMap<String, usize>,
}

/// Payload of the mark-read endpoint: explicit ids, or everything.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub notification_ids: Vec<Uuid>,
    #[serde(default)]
    pub mark_all: bool,
}

impl MarkReadRequest {
    pub fn ids(notification_ids: Vec<Uuid>) -> Self {
        Self {
            notification_ids,
            mark_all: false,
        }
    }

    pub fn all() -> Self {
        Self {
            notification_ids: Vec::new(),
            mark_all: true,
        }
    }
}

/// Request to create a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    /// Kind name on the wire; parsed leniently server-side.
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Events carried on the server-push stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A notification delivered in real time
    Notification { notification: Notification },

    /// Periodic heartbeat; resets the client's failure counter
    Heartbeat { timestamp: i64 },

    /// Connection established confirmation
    Connected { server_id: String, timestamp: i64 },
}

impl StreamEvent {
    pub fn notification(notification: Notification) -> Self {
        StreamEvent::Notification { notification }
    }

    pub fn heartbeat() -> Self {
        StreamEvent::Heartbeat {
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn connected(server_id: impl Into<String>) -> Self {
        StreamEvent::Connected {
            server_id: server_id.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// SSE event name for the `event:` field.
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamEvent::Notification { .. } => "notification",
            StreamEvent::Heartbeat { .. } => "heartbeat",
            StreamEvent::Connected { .. } => "connected",
        }
    }

    /// Encode as one `text/event-stream` frame.
    pub fn to_sse(&self) -> Result<String, serde_json::Error> {
        let data = serde_json::to_string(self)?;
        Ok(format!("event: {}\ndata: {}\n\n", self.event_name(), data))
    }

    /// Decode the `data:` payload of an SSE frame.
    pub fn from_sse_data(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

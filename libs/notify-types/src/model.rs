use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification kind enumeration
///
/// Closed set of events the service desk emits. Servers may grow new kinds
/// before every client is updated, so deserialization of an unrecognized
/// value lands on [`NotificationKind::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// New ticket filed
    TicketCreated,
    /// Ticket assigned to an agent
    TicketAssigned,
    /// Ticket fields or status changed
    TicketUpdated,
    /// Ticket closed as resolved
    TicketResolved,
    /// Ticket escalated to a higher tier
    TicketEscalated,
    /// Comment added to a ticket
    CommentAdded,
    /// SLA deadline approaching
    SlaWarning,
    /// SLA deadline missed
    SlaBreach,
    /// Platform-wide announcement
    SystemAlert,
    /// Anything this build does not recognize
    #[serde(other)]
    Unknown,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TicketCreated => "ticket_created",
            NotificationKind::TicketAssigned => "ticket_assigned",
            NotificationKind::TicketUpdated => "ticket_updated",
            NotificationKind::TicketResolved => "ticket_resolved",
            NotificationKind::TicketEscalated => "ticket_escalated",
            NotificationKind::CommentAdded => "comment_added",
            NotificationKind::SlaWarning => "sla_warning",
            NotificationKind::SlaBreach => "sla_breach",
            NotificationKind::SystemAlert => "system_alert",
            NotificationKind::Unknown => "unknown",
        }
    }

    /// Parse a kind from its wire name. Unrecognized names map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "ticket_created" => NotificationKind::TicketCreated,
            "ticket_assigned" => NotificationKind::TicketAssigned,
            "ticket_updated" => NotificationKind::TicketUpdated,
            "ticket_resolved" => NotificationKind::TicketResolved,
            "ticket_escalated" => NotificationKind::TicketEscalated,
            "comment_added" => NotificationKind::CommentAdded,
            "sla_warning" => NotificationKind::SlaWarning,
            "sla_breach" => NotificationKind::SlaBreach,
            "system_alert" => NotificationKind::SystemAlert,
            _ => NotificationKind::Unknown,
        }
    }

    /// Coarse category used for deep links and batch routing.
    pub fn category(&self) -> &'static str {
        match self {
            NotificationKind::TicketCreated
            | NotificationKind::TicketAssigned
            | NotificationKind::TicketUpdated
            | NotificationKind::TicketResolved
            | NotificationKind::TicketEscalated
            | NotificationKind::CommentAdded => "ticket",
            NotificationKind::SlaWarning | NotificationKind::SlaBreach => "sla",
            NotificationKind::SystemAlert => "system",
            NotificationKind::Unknown => "other",
        }
    }
}

/// Notification priority level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Batched delivery, can wait
    Low,
    /// Standard delivery
    Normal,
    /// Immediate delivery, bypasses batching
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }

    /// Parse a priority from its wire name. Unrecognized names map to `Normal`.
    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Normal,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Core notification model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,

    /// Recipient user ID
    pub recipient_id: Uuid,

    /// Notification kind
    pub kind: NotificationKind,

    /// Short display title
    pub title: String,

    /// Display body
    pub message: String,

    /// Priority level
    #[serde(default)]
    pub priority: Priority,

    /// Read status, mutable only through mark-read operations
    #[serde(default)]
    pub is_read: bool,

    /// Creation timestamp, immutable, ordering key
    pub created_at: DateTime<Utc>,

    /// Opaque bag (ticket id, tenant id, bundled ids, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Notification {
    /// Create an unread notification timestamped now.
    pub fn new(
        recipient_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            title: title.into(),
            message: message.into(),
            priority: Priority::Normal,
            is_read: false,
            created_at: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Ticket id carried in metadata, when present.
    pub fn ticket_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("ticket_id"))
            .and_then(|v| v.as_str())
    }

    /// Tenant id carried in metadata, when present.
    pub fn tenant_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("tenant_id"))
            .and_then(|v| v.as_str())
    }
}

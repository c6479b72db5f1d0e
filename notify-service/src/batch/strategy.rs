use notify_types::Notification;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Closed set of grouping strategies. A `BatchConfig` selects one by name;
/// there is no mechanism for configuration to supply grouping logic itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// One group per notification kind
    ByKind,
    /// One group per recipient
    ByUser,
    /// One group per priority level
    ByPriority,
    /// One group per kind category (ticket / sla / system)
    ByCategory,
    /// One group per tenant (from metadata)
    ByTenant,
    /// One group per calendar day
    ByDate,
}

impl GroupingStrategy {
    /// Resolve a strategy by its configured name. Unrecognized names fall
    /// back to `ByKind` with a warning rather than failing the batch.
    pub fn parse(name: &str) -> Self {
        match name {
            "by_kind" | "by_type" => GroupingStrategy::ByKind,
            "by_user" => GroupingStrategy::ByUser,
            "by_priority" => GroupingStrategy::ByPriority,
            "by_category" => GroupingStrategy::ByCategory,
            "by_tenant" => GroupingStrategy::ByTenant,
            "by_date" => GroupingStrategy::ByDate,
            other => {
                warn!(strategy = other, "unrecognized grouping strategy, using by_kind");
                GroupingStrategy::ByKind
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingStrategy::ByKind => "by_kind",
            GroupingStrategy::ByUser => "by_user",
            GroupingStrategy::ByPriority => "by_priority",
            GroupingStrategy::ByCategory => "by_category",
            GroupingStrategy::ByTenant => "by_tenant",
            GroupingStrategy::ByDate => "by_date",
        }
    }

    /// Pure partition key for a notification under this strategy.
    pub fn group_key(&self, notification: &Notification) -> String {
        match self {
            GroupingStrategy::ByKind => notification.kind.as_str().to_string(),
            GroupingStrategy::ByUser => notification.recipient_id.to_string(),
            GroupingStrategy::ByPriority => notification.priority.as_str().to_string(),
            GroupingStrategy::ByCategory => notification.kind.category().to_string(),
            GroupingStrategy::ByTenant => notification
                .tenant_id()
                .unwrap_or("default")
                .to_string(),
            GroupingStrategy::ByDate => notification.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

//! Presentation view-models for the bell badge and the dropdown.
//!
//! Everything here is a pure function of cache snapshots. Unknown
//! notification kinds always render with the default icon and link; nothing
//! in this module can panic on unexpected input.

use chrono::{DateTime, Utc};
use notify_types::{Notification, NotificationKind};

/// Badge label for the bell icon. `None` when there is nothing unread;
/// display caps at "99+".
pub fn badge_label(unread_count: usize) -> Option<String> {
    match unread_count {
        0 => None,
        n if n > 99 => Some("99+".to_string()),
        n => Some(n.to_string()),
    }
}

/// Icon identifiers, one per notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    TicketNew,
    TicketAssigned,
    TicketUpdated,
    TicketResolved,
    TicketEscalated,
    Comment,
    SlaWarning,
    SlaBreach,
    Megaphone,
    /// Default for kinds this build does not recognize
    Bell,
}

/// Total mapping: every kind gets an icon, unknown kinds get the bell.
pub fn icon_for(kind: NotificationKind) -> Icon {
    match kind {
        NotificationKind::TicketCreated => Icon::TicketNew,
        NotificationKind::TicketAssigned => Icon::TicketAssigned,
        NotificationKind::TicketUpdated => Icon::TicketUpdated,
        NotificationKind::TicketResolved => Icon::TicketResolved,
        NotificationKind::TicketEscalated => Icon::TicketEscalated,
        NotificationKind::CommentAdded => Icon::Comment,
        NotificationKind::SlaWarning => Icon::SlaWarning,
        NotificationKind::SlaBreach => Icon::SlaBreach,
        NotificationKind::SystemAlert => Icon::Megaphone,
        NotificationKind::Unknown => Icon::Bell,
    }
}

/// Deep link derived from kind and metadata. Ticket kinds link to the ticket
/// view when a ticket id is present, SLA kinds to the SLA dashboard, system
/// alerts to settings, everything else to the dashboard.
pub fn link_for(notification: &Notification) -> String {
    match notification.kind.category() {
        "ticket" => match notification.ticket_id() {
            Some(ticket_id) => format!("/tickets/{ticket_id}"),
            None => "/tickets".to_string(),
        },
        "sla" => "/sla".to_string(),
        "system" => "/settings".to_string(),
        _ => "/".to_string(),
    }
}

/// Bucketed relative-time label for `created_at`.
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let secs = elapsed.num_seconds();
    if secs < 60 {
        // Covers clock skew (negative elapsed) as well.
        return "just now".to_string();
    }
    let mins = elapsed.num_minutes();
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", elapsed.num_days())
}

/// One rendered dropdown row.
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownItem {
    pub id: uuid::Uuid,
    pub icon: Icon,
    pub title: String,
    pub message: String,
    pub link: String,
    pub time_label: String,
    /// Drives the unread weight + indicator styling
    pub unread: bool,
}

/// The dropdown as a whole; renders an empty state when there is nothing
/// to show.
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownView {
    pub items: Vec<DropdownItem>,
    pub empty: bool,
}

impl DropdownView {
    pub fn build(notifications: &[Notification], now: DateTime<Utc>) -> Self {
        let items: Vec<DropdownItem> = notifications
            .iter()
            .map(|n| DropdownItem {
                id: n.id,
                icon: icon_for(n.kind),
                title: n.title.clone(),
                message: n.message.clone(),
                link: link_for(n),
                time_label: relative_time(n.created_at, now),
                unread: !n.is_read,
            })
            .collect();
        let empty = items.is_empty();
        Self { items, empty }
    }
}

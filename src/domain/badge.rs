use serde::Serialize;

/// Point-in-time snapshot of unread activity for one (hub, user).
/// Never persisted; safe to recompute and overwrite at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeCounts {
    pub unread_messages: i64,
    pub unread_groups: i64,
    pub upcoming_events_today: i64,
    pub has_more_notifications: bool,
}

impl BadgeCounts {
    pub fn empty() -> Self {
        Self {
            unread_messages: 0,
            unread_groups: 0,
            upcoming_events_today: 0,
            has_more_notifications: false,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::notification::NotificationType;

/// Per-(user, hub) visibility toggles, one per notification type.
/// A missing row or field always reads as enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub messages: bool,
    pub posts: bool,
    pub events: bool,
    pub competitions: bool,
    pub scores: bool,
    pub assignments: bool,
    pub marketplace_items: bool,
    pub resources: bool,
    pub staff_tasks: bool,
    pub staff_time_off: bool,
    pub private_lessons: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            messages: true,
            posts: true,
            events: true,
            competitions: true,
            scores: true,
            assignments: true,
            marketplace_items: true,
            resources: true,
            staff_tasks: true,
            staff_time_off: true,
            private_lessons: true,
        }
    }
}

impl NotificationPreferences {
    /// Exhaustive on purpose: adding a notification type will not
    /// compile until it is mapped to a preference field.
    pub fn is_enabled(&self, kind: NotificationType) -> bool {
        match kind {
            NotificationType::Message => self.messages,
            NotificationType::Post => self.posts,
            NotificationType::Event => self.events,
            NotificationType::Competition => self.competitions,
            NotificationType::Score => self.scores,
            NotificationType::Assignment => self.assignments,
            NotificationType::MarketplaceItem => self.marketplace_items,
            NotificationType::Resource => self.resources,
            NotificationType::StaffTask => self.staff_tasks,
            NotificationType::StaffTimeOff => self.staff_time_off,
            NotificationType::PrivateLesson => self.private_lessons,
        }
    }

    pub fn enabled_types(&self) -> Vec<NotificationType> {
        NotificationType::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    /// Type restriction for feed queries. Returns `None` (no
    /// restriction) when every type is enabled or when every type is
    /// disabled: a filter that could blank out the whole feed is never
    /// constructed.
    pub fn feed_filter(&self) -> Option<Vec<String>> {
        let enabled = self.enabled_types();
        if enabled.is_empty() || enabled.len() == NotificationType::ALL.len() {
            return None;
        }
        Some(enabled.iter().map(|kind| kind.as_db().to_string()).collect())
    }

    pub fn apply(&self, update: &PreferenceUpdate) -> Self {
        Self {
            messages: update.messages.unwrap_or(self.messages),
            posts: update.posts.unwrap_or(self.posts),
            events: update.events.unwrap_or(self.events),
            competitions: update.competitions.unwrap_or(self.competitions),
            scores: update.scores.unwrap_or(self.scores),
            assignments: update.assignments.unwrap_or(self.assignments),
            marketplace_items: update.marketplace_items.unwrap_or(self.marketplace_items),
            resources: update.resources.unwrap_or(self.resources),
            staff_tasks: update.staff_tasks.unwrap_or(self.staff_tasks),
            staff_time_off: update.staff_time_off.unwrap_or(self.staff_time_off),
            private_lessons: update.private_lessons.unwrap_or(self.private_lessons),
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceUpdate {
    pub messages: Option<bool>,
    pub posts: Option<bool>,
    pub events: Option<bool>,
    pub competitions: Option<bool>,
    pub scores: Option<bool>,
    pub assignments: Option<bool>,
    pub marketplace_items: Option<bool>,
    pub resources: Option<bool>,
    pub staff_tasks: Option<bool>,
    pub staff_time_off: Option<bool>,
    pub private_lessons: Option<bool>,
}

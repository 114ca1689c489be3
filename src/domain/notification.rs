use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Closed set of notification kinds. The store keeps the raw string, so
/// rows written by a newer producer decode to `None` and fall back to
/// the dashboard target and the enabled default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Message,
    Post,
    Event,
    Competition,
    Score,
    Assignment,
    MarketplaceItem,
    Resource,
    StaffTask,
    StaffTimeOff,
    PrivateLesson,
}

impl NotificationType {
    pub const ALL: [NotificationType; 11] = [
        NotificationType::Message,
        NotificationType::Post,
        NotificationType::Event,
        NotificationType::Competition,
        NotificationType::Score,
        NotificationType::Assignment,
        NotificationType::MarketplaceItem,
        NotificationType::Resource,
        NotificationType::StaffTask,
        NotificationType::StaffTimeOff,
        NotificationType::PrivateLesson,
    ];

    pub fn as_db(&self) -> &'static str {
        match self {
            NotificationType::Message => "message",
            NotificationType::Post => "post",
            NotificationType::Event => "event",
            NotificationType::Competition => "competition",
            NotificationType::Score => "score",
            NotificationType::Assignment => "assignment",
            NotificationType::MarketplaceItem => "marketplace_item",
            NotificationType::Resource => "resource",
            NotificationType::StaffTask => "staff_task",
            NotificationType::StaffTimeOff => "staff_time_off",
            NotificationType::PrivateLesson => "private_lesson",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "message" => Some(NotificationType::Message),
            "post" => Some(NotificationType::Post),
            "event" => Some(NotificationType::Event),
            "competition" => Some(NotificationType::Competition),
            "score" => Some(NotificationType::Score),
            "assignment" => Some(NotificationType::Assignment),
            "marketplace_item" => Some(NotificationType::MarketplaceItem),
            "resource" => Some(NotificationType::Resource),
            "staff_task" => Some(NotificationType::StaffTask),
            "staff_time_off" => Some(NotificationType::StaffTimeOff),
            "private_lesson" => Some(NotificationType::PrivateLesson),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub hub_id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub body: Option<String>,
    pub actor_id: Option<Uuid>,
    pub actor_name: Option<String>,
    pub actor_avatar_key: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl NotificationRecord {
    pub fn kind(&self) -> Option<NotificationType> {
        NotificationType::from_db(&self.notification_type)
    }
}

/// Resolved navigation destination for a notification tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    Channel(Uuid),
    Group(Uuid),
    Calendar,
    Competition(Uuid),
    Scores,
    Assignments,
    Marketplace,
    Staff,
    PrivateLessons,
    Dashboard,
}

impl NavigationTarget {
    pub fn path(&self) -> String {
        match self {
            NavigationTarget::Channel(id) => format!("/channels/{}", id),
            NavigationTarget::Group(id) => format!("/groups/{}", id),
            NavigationTarget::Calendar => "/calendar".to_string(),
            NavigationTarget::Competition(id) => format!("/competitions/{}", id),
            NavigationTarget::Scores => "/scores".to_string(),
            NavigationTarget::Assignments => "/assignments".to_string(),
            NavigationTarget::Marketplace => "/marketplace".to_string(),
            NavigationTarget::Staff => "/staff".to_string(),
            NavigationTarget::PrivateLessons => "/private-lessons".to_string(),
            NavigationTarget::Dashboard => "/dashboard".to_string(),
        }
    }
}

use time::OffsetDateTime;
use uuid::Uuid;

/// A null cursor means the member has never opened the stream; unread
/// queries treat it as the epoch.
#[derive(Debug, Clone)]
pub struct ChannelMembership {
    pub channel_id: Uuid,
    pub hub_id: Uuid,
    pub user_id: Uuid,
    pub last_read_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct GroupMembership {
    pub group_id: Uuid,
    pub hub_id: Uuid,
    pub user_id: Uuid,
    pub last_viewed_at: Option<OffsetDateTime>,
}

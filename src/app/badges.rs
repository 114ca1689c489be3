use anyhow::Result;
use futures::future::join_all;
use sqlx::Row;
use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::app::context::ActivityContext;
use crate::domain::badge::BadgeCounts;
use crate::domain::membership::{ChannelMembership, GroupMembership};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct BadgeService {
    db: Db,
}

impl BadgeService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Computes a fresh badge snapshot. Infallible at this boundary:
    /// every sub-query failure degrades to 0/empty and is logged, so a
    /// single broken stream never blanks the whole badge.
    pub async fn refresh(&self, ctx: ActivityContext) -> BadgeCounts {
        let (channels, groups, events_today, has_unread) = tokio::join!(
            self.channel_memberships(ctx),
            self.group_memberships(ctx),
            self.upcoming_events_today(ctx),
            self.has_unread_notifications(ctx),
        );

        let channels = channels.unwrap_or_else(|err| {
            warn!(error = ?err, hub_id = %ctx.hub_id, "failed to load channel memberships");
            Vec::new()
        });
        let groups = groups.unwrap_or_else(|err| {
            warn!(error = ?err, hub_id = %ctx.hub_id, "failed to load group memberships");
            Vec::new()
        });

        let channel_counts = join_all(channels.iter().map(|membership| async move {
            (
                membership.channel_id,
                self.unread_in_channel(ctx, membership).await,
            )
        }))
        .await;
        let group_counts = join_all(groups.iter().map(|membership| async move {
            (
                membership.group_id,
                self.unseen_in_group(membership).await,
            )
        }))
        .await;

        BadgeCounts {
            unread_messages: sum_partial("channel", channel_counts),
            unread_groups: sum_partial("group", group_counts),
            upcoming_events_today: events_today.unwrap_or_else(|err| {
                warn!(error = ?err, hub_id = %ctx.hub_id, "failed to count today's events");
                0
            }),
            has_more_notifications: has_unread.unwrap_or_else(|err| {
                warn!(error = ?err, hub_id = %ctx.hub_id, "failed to probe unread notifications");
                false
            }),
        }
    }

    async fn channel_memberships(&self, ctx: ActivityContext) -> Result<Vec<ChannelMembership>> {
        let rows = sqlx::query(
            "SELECT channel_id, hub_id, user_id, last_read_at \
             FROM channel_members \
             WHERE hub_id = $1 AND user_id = $2",
        )
        .bind(ctx.hub_id)
        .bind(ctx.user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut memberships = Vec::with_capacity(rows.len());
        for row in rows {
            memberships.push(ChannelMembership {
                channel_id: row.get("channel_id"),
                hub_id: row.get("hub_id"),
                user_id: row.get("user_id"),
                last_read_at: row.get("last_read_at"),
            });
        }

        Ok(memberships)
    }

    async fn group_memberships(&self, ctx: ActivityContext) -> Result<Vec<GroupMembership>> {
        let rows = sqlx::query(
            "SELECT group_id, hub_id, user_id, last_viewed_at \
             FROM group_members \
             WHERE hub_id = $1 AND user_id = $2",
        )
        .bind(ctx.hub_id)
        .bind(ctx.user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut memberships = Vec::with_capacity(rows.len());
        for row in rows {
            memberships.push(GroupMembership {
                group_id: row.get("group_id"),
                hub_id: row.get("hub_id"),
                user_id: row.get("user_id"),
                last_viewed_at: row.get("last_viewed_at"),
            });
        }

        Ok(memberships)
    }

    /// Messages newer than the member's cursor, excluding their own.
    async fn unread_in_channel(
        &self,
        ctx: ActivityContext,
        membership: &ChannelMembership,
    ) -> Result<i64> {
        let since = membership.last_read_at.unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages \
             WHERE channel_id = $1 AND created_at > $2 AND author_id <> $3",
        )
        .bind(membership.channel_id)
        .bind(since)
        .bind(ctx.user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn unseen_in_group(&self, membership: &GroupMembership) -> Result<i64> {
        let since = membership.last_viewed_at.unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM group_posts \
             WHERE group_id = $1 AND created_at > $2",
        )
        .bind(membership.group_id)
        .bind(since)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn upcoming_events_today(&self, ctx: ActivityContext) -> Result<i64> {
        let today_start = OffsetDateTime::now_utc().date().midnight().assume_utc();
        let tomorrow_start = today_start + Duration::days(1);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM events \
             WHERE hub_id = $1 AND start_time >= $2 AND start_time < $3",
        )
        .bind(ctx.hub_id)
        .bind(today_start)
        .bind(tomorrow_start)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn has_unread_notifications(&self, ctx: ActivityContext) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM notifications \
                WHERE hub_id = $1 AND user_id = $2 AND is_read = FALSE \
             )",
        )
        .bind(ctx.hub_id)
        .bind(ctx.user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }
}

/// Sums per-membership counts, treating each failed count as 0. One
/// broken stream costs only its own contribution.
pub fn sum_partial(stream: &str, counts: Vec<(Uuid, Result<i64>)>) -> i64 {
    let mut total = 0;
    for (id, result) in counts {
        match result {
            Ok(count) => total += count,
            Err(err) => {
                warn!(error = ?err, stream = stream, id = %id, "unread count failed, counting 0");
            }
        }
    }
    total
}

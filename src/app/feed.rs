use std::sync::Arc;

use anyhow::Result;
use redis::AsyncCommands;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::context::ActivityContext;
use crate::app::preferences::PreferenceService;
use crate::app::session::Session;
use crate::domain::notification::NotificationRecord;
use crate::infra::{cache::RedisCache, db::Db};

/// One fetched page plus the termination heuristic: a short page means
/// the feed is exhausted. An exactly full final page costs one extra
/// empty probe fetch, which never loses data.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub records: Vec<NotificationRecord>,
    pub has_more: bool,
}

/// Store access for the notification feed. Owns the unread-count cache.
#[derive(Clone)]
pub struct FeedService {
    db: Db,
    cache: RedisCache,
    page_size: i64,
    unread_ttl_seconds: u64,
}

impl FeedService {
    pub fn new(db: Db, cache: RedisCache, page_size: i64, unread_ttl_seconds: u64) -> Self {
        Self {
            db,
            cache,
            page_size,
            unread_ttl_seconds,
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub async fn fetch_page(
        &self,
        ctx: ActivityContext,
        offset: i64,
        type_filter: Option<Vec<String>>,
    ) -> Result<Vec<NotificationRecord>> {
        let rows = match type_filter {
            Some(types) => {
                sqlx::query(
                    "SELECT id, hub_id, user_id, notification_type, title, body, actor_id, \
                            actor_name, actor_avatar_key, reference_id, reference_type, \
                            is_read, created_at \
                     FROM notifications \
                     WHERE hub_id = $1 AND user_id = $2 AND notification_type = ANY($3) \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $4 OFFSET $5",
                )
                .bind(ctx.hub_id)
                .bind(ctx.user_id)
                .bind(types)
                .bind(self.page_size)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, hub_id, user_id, notification_type, title, body, actor_id, \
                            actor_name, actor_avatar_key, reference_id, reference_type, \
                            is_read, created_at \
                     FROM notifications \
                     WHERE hub_id = $1 AND user_id = $2 \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $3 OFFSET $4",
                )
                .bind(ctx.hub_id)
                .bind(ctx.user_id)
                .bind(self.page_size)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Cached unless the counter key is cold; a recompute applies the
    /// same type filter the listing uses.
    pub async fn unread_count(
        &self,
        ctx: ActivityContext,
        type_filter: Option<Vec<String>>,
    ) -> Result<i64> {
        if let Some(count) = self.cached_unread(ctx).await {
            return Ok(count);
        }

        let count: i64 = match type_filter {
            Some(types) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM notifications \
                     WHERE hub_id = $1 AND user_id = $2 AND is_read = FALSE \
                       AND notification_type = ANY($3)",
                )
                .bind(ctx.hub_id)
                .bind(ctx.user_id)
                .bind(types)
                .fetch_one(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM notifications \
                     WHERE hub_id = $1 AND user_id = $2 AND is_read = FALSE",
                )
                .bind(ctx.hub_id)
                .bind(ctx.user_id)
                .fetch_one(self.db.pool())
                .await?
            }
        };

        self.store_unread(ctx, count).await;
        Ok(count)
    }

    /// Fail-closed: nothing local changes unless the store reports the
    /// row was actually flipped. Scoped to (id, user); other users'
    /// records are untouched and read as a no-op.
    pub async fn mark_read(&self, ctx: ActivityContext, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = TRUE \
             WHERE id = $1 AND user_id = $2 AND is_read = FALSE",
        )
        .bind(id)
        .bind(ctx.user_id)
        .execute(self.db.pool())
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            self.decrement_unread(ctx).await;
        }

        Ok(updated)
    }

    pub async fn mark_all_read(&self, ctx: ActivityContext) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = TRUE \
             WHERE hub_id = $1 AND user_id = $2 AND is_read = FALSE",
        )
        .bind(ctx.hub_id)
        .bind(ctx.user_id)
        .execute(self.db.pool())
        .await?;

        self.zero_unread(ctx).await;
        Ok(result.rows_affected())
    }

    async fn cached_unread(&self, ctx: ActivityContext) -> Option<i64> {
        let mut conn = self.cache.connection().await.ok()?;
        conn.get::<_, Option<i64>>(&unread_key(ctx)).await.ok()?
    }

    async fn store_unread(&self, ctx: ActivityContext, count: i64) {
        if let Ok(mut conn) = self.cache.connection().await {
            if let Err(err) = conn
                .set_ex::<_, _, ()>(&unread_key(ctx), count, self.unread_ttl_seconds)
                .await
            {
                warn!(error = ?err, "failed to write unread-count cache");
            }
        }
    }

    async fn decrement_unread(&self, ctx: ActivityContext) {
        if let Ok(mut conn) = self.cache.connection().await {
            match conn.decr::<_, _, i64>(&unread_key(ctx), 1).await {
                // DECR on a cold key invents -1; floor it back to 0.
                Ok(count) if count < 0 => {
                    let _ = conn
                        .set_ex::<_, _, ()>(&unread_key(ctx), 0i64, self.unread_ttl_seconds)
                        .await;
                }
                Ok(_) => {}
                Err(err) => warn!(error = ?err, "failed to decrement unread-count cache"),
            }
        }
    }

    async fn zero_unread(&self, ctx: ActivityContext) {
        if let Ok(mut conn) = self.cache.connection().await {
            if let Err(err) = conn
                .set_ex::<_, _, ()>(&unread_key(ctx), 0i64, self.unread_ttl_seconds)
                .await
            {
                warn!(error = ?err, "failed to zero unread-count cache");
            }
        }
    }
}

/// Necessary-not-sufficient termination: a short page proves the feed
/// is exhausted, a full one only suggests more.
pub fn page_has_more(page_len: usize, page_size: i64) -> bool {
    page_len as i64 >= page_size
}

fn unread_key(ctx: ActivityContext) -> String {
    format!("feed:unread:{}:{}", ctx.hub_id, ctx.user_id)
}

fn record_from_row(row: &PgRow) -> NotificationRecord {
    NotificationRecord {
        id: row.get("id"),
        hub_id: row.get("hub_id"),
        user_id: row.get("user_id"),
        notification_type: row.get("notification_type"),
        title: row.get("title"),
        body: row.get("body"),
        actor_id: row.get("actor_id"),
        actor_name: row.get("actor_name"),
        actor_avatar_key: row.get("actor_avatar_key"),
        reference_id: row.get("reference_id"),
        reference_type: row.get("reference_type"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}

/// Accumulated listing state for one session.
#[derive(Debug, Default)]
pub struct FeedView {
    records: Vec<NotificationRecord>,
    has_more: bool,
}

impl FeedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Reset replaces, regardless of how much was accumulated; append
    /// extends at the tail.
    pub fn apply_page(&mut self, reset: bool, records: Vec<NotificationRecord>, has_more: bool) {
        if reset {
            self.records = records;
        } else {
            self.records.extend(records);
        }
        self.has_more = has_more;
    }

    pub fn note_read(&mut self, id: Uuid) {
        for record in &mut self.records {
            if record.id == id {
                record.is_read = true;
            }
        }
    }

    pub fn note_all_read(&mut self) {
        for record in &mut self.records {
            record.is_read = true;
        }
    }
}

/// Preference-filtered, read-state-aware view over the feed store,
/// bound to one session.
pub struct FeedReader {
    service: FeedService,
    preferences: PreferenceService,
    session: Arc<Session>,
}

impl FeedReader {
    pub fn new(service: FeedService, preferences: PreferenceService, session: Arc<Session>) -> Self {
        Self {
            service,
            preferences,
            session,
        }
    }

    pub async fn list(&self, reset: bool) -> Result<FeedPage> {
        let ctx = self.session.ctx;
        let filter = self.preferences.get_or_default(ctx).await.feed_filter();

        let (generation, offset) = if reset {
            (self.session.begin_reset(), 0)
        } else {
            (self.session.reset_generation(), self.session.feed_len() as i64)
        };

        let records = self.service.fetch_page(ctx, offset, filter).await?;
        let has_more = page_has_more(records.len(), self.service.page_size());

        if !self
            .session
            .apply_feed_page(generation, reset, records.clone(), has_more)
        {
            debug!(user_id = %ctx.user_id, "discarded stale feed page");
        }

        Ok(FeedPage { records, has_more })
    }

    pub async fn unread_count(&self) -> Result<i64> {
        let ctx = self.session.ctx;
        let filter = self.preferences.get_or_default(ctx).await.feed_filter();
        self.service.unread_count(ctx, filter).await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<bool> {
        let updated = self.service.mark_read(self.session.ctx, id).await?;
        if updated {
            self.session.note_read(id);
        }
        Ok(updated)
    }

    pub async fn mark_all_read(&self) -> Result<u64> {
        let updated = self.service.mark_all_read(self.session.ctx).await?;
        self.session.note_all_read();
        Ok(updated)
    }
}

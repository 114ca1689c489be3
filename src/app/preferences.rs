use anyhow::Result;
use redis::AsyncCommands;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::warn;

use crate::app::context::ActivityContext;
use crate::domain::preferences::{NotificationPreferences, PreferenceUpdate};
use crate::infra::{cache::RedisCache, db::Db};

const PREFS_CACHE_TTL_SECONDS: u64 = 300;

const PREF_COLUMNS: &str = "messages, posts, events, competitions, scores, assignments, \
                            marketplace_items, resources, staff_tasks, staff_time_off, \
                            private_lessons";

#[derive(Clone)]
pub struct PreferenceService {
    db: Db,
    cache: RedisCache,
}

impl PreferenceService {
    pub fn new(db: Db, cache: RedisCache) -> Self {
        Self { db, cache }
    }

    /// Cached read-through; a missing row means everything enabled.
    pub async fn get(&self, ctx: ActivityContext) -> Result<NotificationPreferences> {
        if let Some(prefs) = self.read_cache(ctx).await {
            return Ok(prefs);
        }

        let prefs = self.fetch(ctx).await?.unwrap_or_default();
        self.write_cache(ctx, &prefs).await;
        Ok(prefs)
    }

    /// Read-path degradation: preference lookups never block a caller;
    /// failures read as the all-enabled default.
    pub async fn get_or_default(&self, ctx: ActivityContext) -> NotificationPreferences {
        self.get(ctx).await.unwrap_or_else(|err| {
            warn!(error = ?err, user_id = %ctx.user_id, "preference lookup failed, using defaults");
            NotificationPreferences::default()
        })
    }

    /// Upsert-merge keyed by (user, hub). The merged result is applied
    /// to the cache before the durable write; if that write fails the
    /// cache is reconciled from store truth rather than rolled back —
    /// the toggles are idempotent booleans, so re-reading is exact.
    pub async fn set(
        &self,
        ctx: ActivityContext,
        update: &PreferenceUpdate,
    ) -> Result<NotificationPreferences> {
        let current = match self.get(ctx).await {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(error = ?err, user_id = %ctx.user_id, "merge base unavailable, assuming defaults");
                NotificationPreferences::default()
            }
        };
        let merged = current.apply(update);
        self.write_cache(ctx, &merged).await;

        match self.upsert(ctx, update).await {
            Ok(stored) => {
                self.write_cache(ctx, &stored).await;
                Ok(stored)
            }
            Err(err) => {
                warn!(error = ?err, user_id = %ctx.user_id, "preference write failed, reconciling");
                self.reconcile(ctx).await;
                Err(err)
            }
        }
    }

    async fn fetch(&self, ctx: ActivityContext) -> Result<Option<NotificationPreferences>> {
        let row = sqlx::query(&format!(
            "SELECT {PREF_COLUMNS} FROM notification_preferences \
             WHERE user_id = $1 AND hub_id = $2"
        ))
        .bind(ctx.user_id)
        .bind(ctx.hub_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(prefs_from_row))
    }

    async fn upsert(
        &self,
        ctx: ActivityContext,
        update: &PreferenceUpdate,
    ) -> Result<NotificationPreferences> {
        let row = sqlx::query(&format!(
            "INSERT INTO notification_preferences \
                (user_id, hub_id, messages, posts, events, competitions, scores, assignments, \
                 marketplace_items, resources, staff_tasks, staff_time_off, private_lessons) \
             VALUES ($1, $2, COALESCE($3, TRUE), COALESCE($4, TRUE), COALESCE($5, TRUE), \
                     COALESCE($6, TRUE), COALESCE($7, TRUE), COALESCE($8, TRUE), \
                     COALESCE($9, TRUE), COALESCE($10, TRUE), COALESCE($11, TRUE), \
                     COALESCE($12, TRUE), COALESCE($13, TRUE)) \
             ON CONFLICT (user_id, hub_id) DO UPDATE SET \
                messages = COALESCE($3, notification_preferences.messages), \
                posts = COALESCE($4, notification_preferences.posts), \
                events = COALESCE($5, notification_preferences.events), \
                competitions = COALESCE($6, notification_preferences.competitions), \
                scores = COALESCE($7, notification_preferences.scores), \
                assignments = COALESCE($8, notification_preferences.assignments), \
                marketplace_items = COALESCE($9, notification_preferences.marketplace_items), \
                resources = COALESCE($10, notification_preferences.resources), \
                staff_tasks = COALESCE($11, notification_preferences.staff_tasks), \
                staff_time_off = COALESCE($12, notification_preferences.staff_time_off), \
                private_lessons = COALESCE($13, notification_preferences.private_lessons), \
                updated_at = now() \
             RETURNING {PREF_COLUMNS}"
        ))
        .bind(ctx.user_id)
        .bind(ctx.hub_id)
        .bind(update.messages)
        .bind(update.posts)
        .bind(update.events)
        .bind(update.competitions)
        .bind(update.scores)
        .bind(update.assignments)
        .bind(update.marketplace_items)
        .bind(update.resources)
        .bind(update.staff_tasks)
        .bind(update.staff_time_off)
        .bind(update.private_lessons)
        .fetch_one(self.db.pool())
        .await?;

        Ok(prefs_from_row(&row))
    }

    async fn reconcile(&self, ctx: ActivityContext) {
        match self.fetch(ctx).await {
            Ok(truth) => self.write_cache(ctx, &truth.unwrap_or_default()).await,
            Err(err) => {
                warn!(error = ?err, user_id = %ctx.user_id, "reconcile fetch failed, dropping cache");
                self.drop_cache(ctx).await;
            }
        }
    }

    async fn read_cache(&self, ctx: ActivityContext) -> Option<NotificationPreferences> {
        let mut conn = self.cache.connection().await.ok()?;
        let payload: String = conn.get::<_, Option<String>>(&cache_key(ctx)).await.ok()??;
        serde_json::from_str(&payload).ok()
    }

    async fn write_cache(&self, ctx: ActivityContext, prefs: &NotificationPreferences) {
        if let Ok(mut conn) = self.cache.connection().await {
            if let Ok(payload) = serde_json::to_string(prefs) {
                if let Err(err) = conn
                    .set_ex::<_, _, ()>(&cache_key(ctx), payload, PREFS_CACHE_TTL_SECONDS)
                    .await
                {
                    warn!(error = ?err, "failed to write preference cache");
                }
            }
        }
    }

    async fn drop_cache(&self, ctx: ActivityContext) {
        if let Ok(mut conn) = self.cache.connection().await {
            let _ = conn.del::<_, ()>(&cache_key(ctx)).await;
        }
    }
}

fn cache_key(ctx: ActivityContext) -> String {
    format!("prefs:{}:{}", ctx.hub_id, ctx.user_id)
}

fn prefs_from_row(row: &PgRow) -> NotificationPreferences {
    NotificationPreferences {
        messages: row.get("messages"),
        posts: row.get("posts"),
        events: row.get("events"),
        competitions: row.get("competitions"),
        scores: row.get("scores"),
        assignments: row.get("assignments"),
        marketplace_items: row.get("marketplace_items"),
        resources: row.get("resources"),
        staff_tasks: row.get("staff_tasks"),
        staff_time_off: row.get("staff_time_off"),
        private_lessons: row.get("private_lessons"),
    }
}

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::context::ActivityContext;
use crate::domain::notification::{NavigationTarget, NotificationType};
use crate::domain::push::{PermissionStatus, PushPlatformKind, PushToken, RegistrationEvent};
use crate::infra::db::Db;
use crate::infra::push::PushPlatform;

/// What the device knows about itself at registration time.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceReport {
    pub platform: PushPlatformKind,
    pub physical_device: bool,
    pub permission: PermissionStatus,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// Non-physical device; nothing was attempted or written.
    Skipped,
    /// Permission is undetermined; the device should prompt and retry.
    PermissionRequested,
    /// Permission denied; terminal until the user re-initiates.
    Denied,
    /// Granted, but no token could be bound (missing platform identity,
    /// no token in the report, or a token the platform rejected).
    Unavailable,
    Active,
}

impl RegistrationOutcome {
    /// Lifecycle events this outcome implies for the per-device state
    /// machine.
    pub fn events(&self) -> &'static [RegistrationEvent] {
        match self {
            RegistrationOutcome::Skipped => &[],
            RegistrationOutcome::PermissionRequested => &[RegistrationEvent::PermissionPrompted],
            RegistrationOutcome::Denied => &[RegistrationEvent::PermissionDenied],
            RegistrationOutcome::Unavailable => &[RegistrationEvent::PermissionGranted],
            RegistrationOutcome::Active => &[
                RegistrationEvent::PermissionGranted,
                RegistrationEvent::TokenIssued,
                RegistrationEvent::Activated,
            ],
        }
    }
}

#[derive(Clone)]
pub struct PushService {
    db: Db,
    platform: Arc<dyn PushPlatform>,
    channel: String,
}

impl PushService {
    pub fn new(db: Db, platform: Arc<dyn PushPlatform>, channel: String) -> Self {
        Self {
            db,
            platform,
            channel,
        }
    }

    /// One-shot per login; concurrent duplicates are safe because the
    /// token row is an upsert, not an insert.
    pub async fn register(
        &self,
        ctx: ActivityContext,
        report: &DeviceReport,
    ) -> Result<RegistrationOutcome> {
        let decision = preflight(report, self.platform.is_configured());

        if decision == Some(RegistrationOutcome::Skipped) {
            debug!(user_id = %ctx.user_id, "not a physical device, skipping push registration");
            return Ok(RegistrationOutcome::Skipped);
        }

        if let Err(err) = self.platform.ensure_channel(&self.channel).await {
            warn!(error = ?err, channel = %self.channel, "failed to ensure notification channel");
        }

        match decision {
            Some(RegistrationOutcome::PermissionRequested) => {
                Ok(RegistrationOutcome::PermissionRequested)
            }
            Some(RegistrationOutcome::Denied) => {
                info!(user_id = %ctx.user_id, "push permission denied");
                Ok(RegistrationOutcome::Denied)
            }
            Some(RegistrationOutcome::Unavailable) => {
                error!(user_id = %ctx.user_id, "push token unavailable, registration halted");
                Ok(RegistrationOutcome::Unavailable)
            }
            _ => {
                let Some(token) = report.token.as_deref() else {
                    return Ok(RegistrationOutcome::Unavailable);
                };
                if let Err(err) = self.platform.validate_token(report.platform, token).await {
                    warn!(error = ?err, user_id = %ctx.user_id, "rejected push token");
                    return Ok(RegistrationOutcome::Unavailable);
                }

                self.upsert_token(ctx, report.platform, token).await?;
                info!(user_id = %ctx.user_id, platform = report.platform.as_db(), "push token active");
                Ok(RegistrationOutcome::Active)
            }
        }
    }

    /// Soft delete; history is kept so a later registration of the same
    /// token reactivates the row in place.
    pub async fn deregister(&self, ctx: ActivityContext, token: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE push_tokens \
             SET is_active = FALSE, updated_at = now() \
             WHERE user_id = $1 AND token = $2 AND is_active = TRUE",
        )
        .bind(ctx.user_id)
        .bind(token)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All currently active device tokens for the caller; multi-device
    /// is the normal case, not an error.
    pub async fn active_tokens(&self, ctx: ActivityContext) -> Result<Vec<PushToken>> {
        let rows = sqlx::query(
            "SELECT id, user_id, token, platform, is_active, created_at, updated_at \
             FROM push_tokens \
             WHERE user_id = $1 AND is_active = TRUE \
             ORDER BY updated_at DESC",
        )
        .bind(ctx.user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut tokens = Vec::with_capacity(rows.len());
        for row in rows {
            tokens.push(PushToken {
                id: row.get("id"),
                user_id: row.get("user_id"),
                token: row.get("token"),
                platform: row.get("platform"),
                is_active: row.get("is_active"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(tokens)
    }

    async fn upsert_token(
        &self,
        ctx: ActivityContext,
        platform: PushPlatformKind,
        token: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO push_tokens (id, user_id, token, platform, is_active) \
             VALUES ($1, $2, $3, $4, TRUE) \
             ON CONFLICT (user_id, token) DO UPDATE SET \
                is_active = TRUE, \
                platform = EXCLUDED.platform, \
                updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(ctx.user_id)
        .bind(token)
        .bind(platform.as_db())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

/// Everything that can be decided before token binding. `None` means
/// registration may proceed to validate and store the reported token.
pub fn preflight(report: &DeviceReport, platform_configured: bool) -> Option<RegistrationOutcome> {
    if !report.physical_device {
        return Some(RegistrationOutcome::Skipped);
    }
    match report.permission {
        PermissionStatus::Undetermined => Some(RegistrationOutcome::PermissionRequested),
        PermissionStatus::Denied => Some(RegistrationOutcome::Denied),
        PermissionStatus::Granted => {
            if !platform_configured || report.token.is_none() {
                Some(RegistrationOutcome::Unavailable)
            } else {
                None
            }
        }
    }
}

/// Total deep-link dispatch: every notification resolves to some
/// navigation target, so a tap can never dead-end. Types that need a
/// reference but arrive without one, and types this build does not
/// know, land on the dashboard.
pub fn resolve_target(
    kind: Option<NotificationType>,
    reference_id: Option<Uuid>,
) -> NavigationTarget {
    match kind {
        Some(NotificationType::Message) => reference_id
            .map(NavigationTarget::Channel)
            .unwrap_or(NavigationTarget::Dashboard),
        Some(NotificationType::Post) => reference_id
            .map(NavigationTarget::Group)
            .unwrap_or(NavigationTarget::Dashboard),
        Some(NotificationType::Event) => NavigationTarget::Calendar,
        Some(NotificationType::Competition) => reference_id
            .map(NavigationTarget::Competition)
            .unwrap_or(NavigationTarget::Dashboard),
        Some(NotificationType::Score) => NavigationTarget::Scores,
        Some(NotificationType::Assignment) => NavigationTarget::Assignments,
        Some(NotificationType::MarketplaceItem) | Some(NotificationType::Resource) => {
            NavigationTarget::Marketplace
        }
        Some(NotificationType::StaffTask) | Some(NotificationType::StaffTimeOff) => {
            NavigationTarget::Staff
        }
        Some(NotificationType::PrivateLesson) => NavigationTarget::PrivateLessons,
        None => NavigationTarget::Dashboard,
    }
}

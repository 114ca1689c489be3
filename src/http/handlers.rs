use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::badges::BadgeService;
use crate::app::feed::{FeedReader, FeedService};
use crate::app::preferences::PreferenceService;
use crate::app::push::{self, DeviceReport, PushService, RegistrationOutcome};
use crate::app::session::{self, Session};
use crate::domain::badge::BadgeCounts;
use crate::domain::notification::{NotificationRecord, NotificationType};
use crate::domain::preferences::{NotificationPreferences, PreferenceUpdate};
use crate::domain::push::RegistrationPhase;
use crate::http::{AppError, AuthUser, Scope};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.cache.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

fn feed_reader(state: &AppState, session: Arc<Session>) -> FeedReader {
    FeedReader::new(
        FeedService::new(
            state.db.clone(),
            state.cache.clone(),
            state.feed_page_size,
            state.unread_cache_ttl_seconds,
        ),
        PreferenceService::new(state.db.clone(), state.cache.clone()),
        session,
    )
}

pub async fn get_badges(
    scope: Scope,
    State(state): State<AppState>,
) -> Result<Json<BadgeCounts>, AppError> {
    let session = session::ensure(&state, scope.ctx);
    let counts = BadgeService::new(state.db.clone()).refresh(scope.ctx).await;

    // Overlapping with a poll tick is fine: snapshots are idempotent
    // and the registry discards anything from a dead session.
    state
        .sessions
        .apply_badges(scope.ctx, session.epoch, counts.clone());

    Ok(Json(counts))
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub reset: Option<bool>,
}

/// A record plus its resolved tap target.
#[derive(Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub record: NotificationRecord,
    pub target: String,
}

impl NotificationView {
    fn from_record(record: NotificationRecord) -> Self {
        let target = push::resolve_target(record.kind(), record.reference_id).path();
        Self { record, target }
    }
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub items: Vec<NotificationView>,
    pub has_more: bool,
}

pub async fn list_notifications(
    scope: Scope,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let session = session::ensure(&state, scope.ctx);
    let reader = feed_reader(&state, session);

    let page = reader.list(query.reset.unwrap_or(false)).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to list notifications");
        AppError::internal("failed to list notifications")
    })?;

    Ok(Json(FeedResponse {
        items: page
            .records
            .into_iter()
            .map(NotificationView::from_record)
            .collect(),
        has_more: page.has_more,
    }))
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

pub async fn unread_count(
    scope: Scope,
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let session = session::ensure(&state, scope.ctx);
    let reader = feed_reader(&state, session);

    let count = reader.unread_count().await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to count unread notifications");
        AppError::internal("failed to count unread notifications")
    })?;

    Ok(Json(UnreadCountResponse { count }))
}

pub async fn mark_notification_read(
    scope: Scope,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let session = session::ensure(&state, scope.ctx);
    let reader = feed_reader(&state, session);

    // Already-read, unknown, and other users' records all come back as
    // a no-op; only a store failure is an error.
    reader.mark_read(id).await.map_err(|err| {
        tracing::error!(error = ?err, notification_id = %id, user_id = %scope.ctx.user_id, "failed to mark notification read");
        AppError::internal("failed to mark notification read")
    })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_notifications_read(
    scope: Scope,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let session = session::ensure(&state, scope.ctx);
    let reader = feed_reader(&state, session);

    reader.mark_all_read().await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to mark notifications read");
        AppError::internal("failed to mark notifications read")
    })?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub reference_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct TargetResponse {
    pub target: String,
}

pub async fn resolve_notification_target(
    _user: AuthUser,
    Query(query): Query<ResolveQuery>,
) -> Json<TargetResponse> {
    let kind = query
        .kind
        .as_deref()
        .and_then(NotificationType::from_db);

    Json(TargetResponse {
        target: push::resolve_target(kind, query.reference_id).path(),
    })
}

pub async fn get_preferences(
    scope: Scope,
    State(state): State<AppState>,
) -> Result<Json<NotificationPreferences>, AppError> {
    session::ensure(&state, scope.ctx);

    let service = PreferenceService::new(state.db.clone(), state.cache.clone());
    let prefs = service.get(scope.ctx).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to load preferences");
        AppError::internal("failed to load preferences")
    })?;

    Ok(Json(prefs))
}

pub async fn update_preferences(
    scope: Scope,
    State(state): State<AppState>,
    Json(update): Json<PreferenceUpdate>,
) -> Result<Json<NotificationPreferences>, AppError> {
    session::ensure(&state, scope.ctx);

    let service = PreferenceService::new(state.db.clone(), state.cache.clone());
    let prefs = service.set(scope.ctx, &update).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to update preferences");
        AppError::internal("failed to update preferences")
    })?;

    Ok(Json(prefs))
}

#[derive(Serialize)]
pub struct RegistrationResponse {
    pub status: RegistrationOutcome,
    pub phase: RegistrationPhase,
}

pub async fn register_push(
    scope: Scope,
    State(state): State<AppState>,
    Json(report): Json<DeviceReport>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let session = session::ensure(&state, scope.ctx);

    let service = PushService::new(
        state.db.clone(),
        state.push.clone(),
        state.push_channel.clone(),
    );
    let outcome = service.register(scope.ctx, &report).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to register push token");
        AppError::internal("failed to register push token")
    })?;

    let mut phase = session.registration_phase();
    for event in outcome.events() {
        phase = session.advance_registration(*event);
    }

    Ok(Json(RegistrationResponse {
        status: outcome,
        phase,
    }))
}

#[derive(Serialize)]
pub struct PushTokensResponse {
    pub tokens: Vec<crate::domain::push::PushToken>,
}

pub async fn list_push_tokens(
    scope: Scope,
    State(state): State<AppState>,
) -> Result<Json<PushTokensResponse>, AppError> {
    session::ensure(&state, scope.ctx);

    let service = PushService::new(
        state.db.clone(),
        state.push.clone(),
        state.push_channel.clone(),
    );
    let tokens = service.active_tokens(scope.ctx).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to list push tokens");
        AppError::internal("failed to list push tokens")
    })?;

    Ok(Json(PushTokensResponse { tokens }))
}

#[derive(Deserialize)]
pub struct DeregisterRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct DeregisterResponse {
    pub deregistered: bool,
}

pub async fn deregister_push(
    scope: Scope,
    State(state): State<AppState>,
    Json(payload): Json<DeregisterRequest>,
) -> Result<Json<DeregisterResponse>, AppError> {
    let session = session::ensure(&state, scope.ctx);

    let service = PushService::new(
        state.db.clone(),
        state.push.clone(),
        state.push_channel.clone(),
    );
    let deregistered = service
        .deregister(scope.ctx, &payload.token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %scope.ctx.user_id, "failed to deregister push token");
            AppError::internal("failed to deregister push token")
        })?;

    // In-memory state clears even when no row was active.
    session.advance_registration(crate::domain::push::RegistrationEvent::Deregistered);

    Ok(Json(DeregisterResponse { deregistered }))
}

pub async fn end_session(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.sessions.end(user.user_id);
    Ok(StatusCode::NO_CONTENT)
}

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderName;
use uuid::Uuid;

use crate::app::auth::AuthService;
use crate::app::context::ActivityContext;
use crate::http::AppError;
use crate::AppState;

const HUB_HEADER: HeaderName = HeaderName::from_static("x-hub-id");

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Authenticated caller plus the hub named in the request: the full
/// scope every operation runs under.
#[derive(Debug, Clone, Copy)]
pub struct Scope {
    pub ctx: ActivityContext,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

        let service = AuthService::new(state.paseto_access_key);
        let session = service
            .verify_access_token(token)
            .map_err(|_| AppError::internal("failed to authenticate"))?;

        let session = session.ok_or_else(|| AppError::unauthorized("invalid token"))?;
        Ok(AuthUser {
            user_id: session.user_id,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Scope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let hub_id = parts
            .headers
            .get(&HUB_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::bad_request("missing x-hub-id header"))?;
        let hub_id = Uuid::parse_str(hub_id)
            .map_err(|_| AppError::bad_request("invalid x-hub-id header"))?;

        Ok(Scope {
            ctx: ActivityContext::new(hub_id, user.user_id),
        })
    }
}

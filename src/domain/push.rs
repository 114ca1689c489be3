use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushPlatformKind {
    Ios,
    Android,
    Web,
}

impl PushPlatformKind {
    pub fn as_db(&self) -> &'static str {
        match self {
            PushPlatformKind::Ios => "ios",
            PushPlatformKind::Android => "android",
            PushPlatformKind::Web => "web",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Undetermined,
    Granted,
    Denied,
}

/// Per-device registration lifecycle. Denied is terminal until the user
/// re-initiates; rows in push_tokens are only ever soft-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPhase {
    Unregistered,
    PermissionRequested,
    Granted,
    Denied,
    TokenIssued,
    Active,
    Deregistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationEvent {
    PermissionPrompted,
    PermissionGranted,
    PermissionDenied,
    TokenIssued,
    Activated,
    Deregistered,
}

impl RegistrationPhase {
    /// Total transition function; events that are not legal from the
    /// current phase leave it unchanged.
    pub fn advance(self, event: RegistrationEvent) -> RegistrationPhase {
        use RegistrationEvent as E;
        use RegistrationPhase as P;
        match (self, event) {
            (P::Unregistered | P::Deregistered, E::PermissionPrompted) => P::PermissionRequested,
            (P::Unregistered | P::Deregistered | P::PermissionRequested, E::PermissionGranted) => {
                P::Granted
            }
            (P::Unregistered | P::Deregistered | P::PermissionRequested, E::PermissionDenied) => {
                P::Denied
            }
            (P::Granted, E::TokenIssued) => P::TokenIssued,
            (P::TokenIssued, E::Activated) => P::Active,
            (_, E::Deregistered) => P::Deregistered,
            (current, _) => current,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PushToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub platform: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

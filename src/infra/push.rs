use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::domain::push::PushPlatformKind;

const MAX_TOKEN_LEN: usize = 4096;

/// Platform push capability. Probed once at startup; hosts without a
/// configured push identity get the no-op implementation so the rest of
/// the service keeps running with push registration reported as
/// unavailable.
#[axum::async_trait]
pub trait PushPlatform: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Idempotently ensure the notification channel/category exists.
    async fn ensure_channel(&self, channel: &str) -> Result<()>;

    /// Reject tokens that cannot belong to this deployment's identity.
    async fn validate_token(&self, platform: PushPlatformKind, token: &str) -> Result<()>;
}

pub struct FcmPlatform {
    project_id: String,
}

#[axum::async_trait]
impl PushPlatform for FcmPlatform {
    fn is_configured(&self) -> bool {
        true
    }

    async fn ensure_channel(&self, channel: &str) -> Result<()> {
        // Channels live on the device; the server side only records the
        // descriptor it expects clients to have created.
        debug!(project_id = %self.project_id, channel = channel, "notification channel ensured");
        Ok(())
    }

    async fn validate_token(&self, platform: PushPlatformKind, token: &str) -> Result<()> {
        if token.trim().is_empty() {
            return Err(anyhow!("empty push token"));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(anyhow!("push token exceeds {} bytes", MAX_TOKEN_LEN));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(anyhow!("push token contains whitespace"));
        }
        debug!(platform = platform.as_db(), "push token accepted");
        Ok(())
    }
}

pub struct NoopPushPlatform;

#[axum::async_trait]
impl PushPlatform for NoopPushPlatform {
    fn is_configured(&self) -> bool {
        false
    }

    async fn ensure_channel(&self, _channel: &str) -> Result<()> {
        Ok(())
    }

    async fn validate_token(&self, _platform: PushPlatformKind, _token: &str) -> Result<()> {
        Err(anyhow!("push platform not configured"))
    }
}

/// Environment probe. Missing identity is fatal to the push feature
/// only, never to the host.
pub fn probe(config: &AppConfig) -> Arc<dyn PushPlatform> {
    match &config.push_project_id {
        Some(project_id) if !project_id.trim().is_empty() => Arc::new(FcmPlatform {
            project_id: project_id.clone(),
        }),
        _ => {
            error!("PUSH_PROJECT_ID not set; push registration disabled");
            Arc::new(NoopPushPlatform)
        }
    }
}

use std::sync::Arc;

pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;
pub mod jobs;

use crate::app::session::SessionRegistry;
use crate::infra::{cache::RedisCache, db::Db, push::PushPlatform};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub cache: RedisCache,
    pub sessions: SessionRegistry,
    pub push: Arc<dyn PushPlatform>,
    pub paseto_access_key: [u8; 32],
    pub feed_page_size: i64,
    pub unread_cache_ttl_seconds: u64,
    pub badge_poll_interval_seconds: u64,
    pub session_idle_seconds: u64,
    pub push_channel: String,
}

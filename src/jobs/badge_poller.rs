use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::badges::BadgeService;
use crate::app::context::ActivityContext;
use crate::app::feed::FeedService;
use crate::app::preferences::PreferenceService;
use crate::AppState;

/// Per-session refresh loop. Spawned when a session starts, aborted
/// when it ends or switches hub; the epoch check makes any refresh that
/// outlives its session a discarded no-op rather than a stale write.
pub async fn session_loop(state: AppState, ctx: ActivityContext, epoch: u64) {
    let interval = Duration::from_secs(state.badge_poll_interval_seconds.max(1));
    info!(hub_id = %ctx.hub_id, user_id = %ctx.user_id, "badge poller started");

    loop {
        if !state.sessions.matches(ctx.user_id, epoch) {
            break;
        }

        refresh_once(&state, ctx, epoch).await;

        tokio::time::sleep(interval).await;

        if state.sessions.idle_expired(ctx.user_id, state.session_idle_seconds) {
            debug!(user_id = %ctx.user_id, "session idle, releasing poller");
            state.sessions.end(ctx.user_id);
            break;
        }
    }

    info!(hub_id = %ctx.hub_id, user_id = %ctx.user_id, "badge poller stopped");
}

/// One refresh: recompute the badge snapshot and warm the unread-count
/// cache. Applied through the registry's staleness check.
pub async fn refresh_once(state: &AppState, ctx: ActivityContext, epoch: u64) {
    let counts = BadgeService::new(state.db.clone()).refresh(ctx).await;

    let feed = FeedService::new(
        state.db.clone(),
        state.cache.clone(),
        state.feed_page_size,
        state.unread_cache_ttl_seconds,
    );
    let filter = PreferenceService::new(state.db.clone(), state.cache.clone())
        .get_or_default(ctx)
        .await
        .feed_filter();
    if let Err(err) = feed.unread_count(ctx, filter).await {
        warn!(error = ?err, user_id = %ctx.user_id, "failed to refresh unread count");
    }

    if !state.sessions.apply_badges(ctx, epoch, counts) {
        debug!(user_id = %ctx.user_id, "discarded stale badge refresh");
    }
}

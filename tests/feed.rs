//! Feed Reader Tests
//!
//! Covers the in-memory view (replace vs. append, read-state notes),
//! the pagination termination heuristic, and the reset generation and
//! session staleness guards.

use time::OffsetDateTime;
use uuid::Uuid;

use pulse::app::context::ActivityContext;
use pulse::app::feed::{page_has_more, FeedView};
use pulse::app::session::SessionRegistry;
use pulse::domain::badge::BadgeCounts;
use pulse::domain::notification::NotificationRecord;

const PAGE_SIZE: i64 = 20;

fn record(ctx: ActivityContext, is_read: bool) -> NotificationRecord {
    NotificationRecord {
        id: Uuid::new_v4(),
        hub_id: ctx.hub_id,
        user_id: ctx.user_id,
        notification_type: "message".to_string(),
        title: "New message".to_string(),
        body: None,
        actor_id: None,
        actor_name: None,
        actor_avatar_key: None,
        reference_id: Some(Uuid::new_v4()),
        reference_type: Some("channel".to_string()),
        is_read,
        created_at: OffsetDateTime::now_utc(),
    }
}

fn ctx() -> ActivityContext {
    ActivityContext::new(Uuid::new_v4(), Uuid::new_v4())
}

fn page(ctx: ActivityContext, len: usize) -> Vec<NotificationRecord> {
    (0..len).map(|_| record(ctx, false)).collect()
}

// ===========================================================================
// Pagination termination
// ===========================================================================

#[test]
fn short_page_means_exhausted() {
    assert!(!page_has_more(5, PAGE_SIZE));
    assert!(!page_has_more(19, PAGE_SIZE));
    assert!(!page_has_more(0, PAGE_SIZE));
}

#[test]
fn full_page_means_possibly_more() {
    // An exactly full final page reports more and costs one empty
    // probe fetch; the probe then closes the feed.
    assert!(page_has_more(20, PAGE_SIZE));
    assert!(!page_has_more(0, PAGE_SIZE));
}

// ===========================================================================
// FeedView
// ===========================================================================

#[test]
fn reset_replaces_accumulated_state() {
    let ctx = ctx();
    let mut view = FeedView::new();

    view.apply_page(false, page(ctx, 20), true);
    view.apply_page(false, page(ctx, 20), true);
    assert_eq!(view.len(), 40);

    view.apply_page(true, page(ctx, 3), false);
    assert_eq!(view.len(), 3);
    assert!(!view.has_more());
}

#[test]
fn append_extends_at_the_tail() {
    let ctx = ctx();
    let mut view = FeedView::new();

    let first = page(ctx, 20);
    let first_ids: Vec<Uuid> = first.iter().map(|r| r.id).collect();
    view.apply_page(true, first, true);
    view.apply_page(false, page(ctx, 5), false);

    assert_eq!(view.len(), 25);
    assert!(!view.has_more());
    let head_ids: Vec<Uuid> = view.records()[..20].iter().map(|r| r.id).collect();
    assert_eq!(head_ids, first_ids);
}

#[test]
fn note_read_is_idempotent() {
    let ctx = ctx();
    let mut view = FeedView::new();
    let records = page(ctx, 3);
    let target = records[1].id;
    view.apply_page(true, records, false);

    view.note_read(target);
    view.note_read(target);

    let read: Vec<bool> = view.records().iter().map(|r| r.is_read).collect();
    assert_eq!(read, vec![false, true, false]);
}

#[test]
fn note_all_read_marks_everything() {
    let ctx = ctx();
    let mut view = FeedView::new();
    view.apply_page(true, page(ctx, 4), false);

    view.note_all_read();

    assert!(view.records().iter().all(|r| r.is_read));
}

// ===========================================================================
// Reset generation guard
// ===========================================================================

#[test]
fn stale_reset_is_discarded() {
    let ctx = ctx();
    let registry = SessionRegistry::new();
    let (session, _) = registry.begin(ctx);

    let slow_reset = session.begin_reset();
    let fast_reset = session.begin_reset();

    // The newer reset lands first.
    assert!(session.apply_feed_page(fast_reset, true, page(ctx, 2), false));
    // The older in-flight reset must not overwrite it.
    assert!(!session.apply_feed_page(slow_reset, true, page(ctx, 20), true));

    assert_eq!(session.feed_len(), 2);
}

#[test]
fn append_from_before_a_reset_is_discarded() {
    let ctx = ctx();
    let registry = SessionRegistry::new();
    let (session, _) = registry.begin(ctx);

    let generation = session.begin_reset();
    assert!(session.apply_feed_page(generation, true, page(ctx, 20), true));

    let newer = session.begin_reset();
    assert!(!session.apply_feed_page(generation, false, page(ctx, 20), true));
    assert!(session.apply_feed_page(newer, true, page(ctx, 1), false));
    assert_eq!(session.feed_len(), 1);
}

// ===========================================================================
// Session staleness
// ===========================================================================

#[test]
fn same_context_reuses_the_session() {
    let ctx = ctx();
    let registry = SessionRegistry::new();

    let (first, created_first) = registry.begin(ctx);
    let (second, created_second) = registry.begin(ctx);

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first.epoch, second.epoch);
}

#[test]
fn hub_change_restarts_the_session() {
    let user_id = Uuid::new_v4();
    let home = ActivityContext::new(Uuid::new_v4(), user_id);
    let away = ActivityContext::new(Uuid::new_v4(), user_id);
    let registry = SessionRegistry::new();

    let (old, _) = registry.begin(home);
    let (new, created) = registry.begin(away);

    assert!(created);
    assert_ne!(old.epoch, new.epoch);
    assert!(!registry.matches(user_id, old.epoch));
    assert!(registry.matches(user_id, new.epoch));
}

#[test]
fn badge_result_from_a_dead_session_is_discarded() {
    let ctx = ctx();
    let registry = SessionRegistry::new();
    let (session, _) = registry.begin(ctx);
    let epoch = session.epoch;

    registry.end(ctx.user_id);

    let counts = BadgeCounts {
        unread_messages: 9,
        unread_groups: 1,
        upcoming_events_today: 2,
        has_more_notifications: true,
    };
    assert!(!registry.apply_badges(ctx, epoch, counts));
}

#[test]
fn badge_result_from_the_old_hub_is_discarded() {
    let user_id = Uuid::new_v4();
    let home = ActivityContext::new(Uuid::new_v4(), user_id);
    let away = ActivityContext::new(Uuid::new_v4(), user_id);
    let registry = SessionRegistry::new();

    let (old, _) = registry.begin(home);
    let old_epoch = old.epoch;
    let (new, _) = registry.begin(away);

    let counts = BadgeCounts::empty();
    assert!(!registry.apply_badges(home, old_epoch, counts.clone()));
    assert!(registry.apply_badges(away, new.epoch, counts));
    assert!(new.badges().is_some());
}

#[test]
fn missing_session_counts_as_idle() {
    let registry = SessionRegistry::new();
    assert!(registry.idle_expired(Uuid::new_v4(), 300));
}

#[test]
fn fresh_session_is_not_idle() {
    let ctx = ctx();
    let registry = SessionRegistry::new();
    registry.begin(ctx);

    assert!(!registry.idle_expired(ctx.user_id, 300));
    assert!(registry.idle_expired(ctx.user_id, 0));
}

//! Preference Tests
//!
//! Covers defaults, partial merges, and fail-open filter construction.

use pulse::domain::notification::NotificationType;
use pulse::domain::preferences::{NotificationPreferences, PreferenceUpdate};

// ===========================================================================
// Defaults
// ===========================================================================

#[test]
fn missing_preferences_enable_every_type() {
    let prefs = NotificationPreferences::default();

    for kind in NotificationType::ALL {
        assert!(prefs.is_enabled(kind), "{:?} should default to enabled", kind);
    }
}

// ===========================================================================
// Partial updates
// ===========================================================================

#[test]
fn apply_merges_only_provided_fields() {
    let current = NotificationPreferences::default();
    let update = PreferenceUpdate {
        messages: Some(false),
        scores: Some(false),
        ..PreferenceUpdate::default()
    };

    let merged = current.apply(&update);

    assert!(!merged.messages);
    assert!(!merged.scores);
    assert!(merged.posts);
    assert!(merged.events);
    assert!(merged.private_lessons);
}

#[test]
fn apply_is_idempotent() {
    let update = PreferenceUpdate {
        events: Some(false),
        ..PreferenceUpdate::default()
    };

    let once = NotificationPreferences::default().apply(&update);
    let twice = once.apply(&update);

    assert_eq!(once, twice);
}

// ===========================================================================
// Feed filter construction
// ===========================================================================

#[test]
fn all_enabled_builds_no_filter() {
    assert_eq!(NotificationPreferences::default().feed_filter(), None);
}

#[test]
fn all_disabled_builds_no_filter() {
    let update = PreferenceUpdate {
        messages: Some(false),
        posts: Some(false),
        events: Some(false),
        competitions: Some(false),
        scores: Some(false),
        assignments: Some(false),
        marketplace_items: Some(false),
        resources: Some(false),
        staff_tasks: Some(false),
        staff_time_off: Some(false),
        private_lessons: Some(false),
    };
    let prefs = NotificationPreferences::default().apply(&update);

    assert!(prefs.enabled_types().is_empty());
    // Fail open: a filter that could blank the feed is never built.
    assert_eq!(prefs.feed_filter(), None);
}

#[test]
fn strict_subset_restricts_to_enabled_types() {
    let update = PreferenceUpdate {
        messages: Some(false),
        ..PreferenceUpdate::default()
    };
    let prefs = NotificationPreferences::default().apply(&update);

    let filter = prefs.feed_filter().expect("strict subset should filter");
    assert_eq!(filter.len(), NotificationType::ALL.len() - 1);
    assert!(!filter.contains(&"message".to_string()));
    assert!(filter.contains(&"post".to_string()));
}

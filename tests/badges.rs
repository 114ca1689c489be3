//! Badge Aggregation Tests
//!
//! Covers partial-failure isolation when summing per-membership counts.

use anyhow::anyhow;
use uuid::Uuid;

use pulse::app::badges::sum_partial;
use pulse::domain::badge::BadgeCounts;

#[test]
fn sums_all_successful_counts() {
    let counts = vec![
        (Uuid::new_v4(), Ok(3)),
        (Uuid::new_v4(), Ok(0)),
        (Uuid::new_v4(), Ok(7)),
    ];

    assert_eq!(sum_partial("channel", counts), 10);
}

#[test]
fn failed_count_contributes_zero() {
    let counts = vec![
        (Uuid::new_v4(), Ok(4)),
        (Uuid::new_v4(), Err(anyhow!("connection reset"))),
        (Uuid::new_v4(), Ok(2)),
    ];

    // One broken stream never blanks the whole badge.
    assert_eq!(sum_partial("channel", counts), 6);
}

#[test]
fn all_failures_sum_to_zero() {
    let counts = vec![
        (Uuid::new_v4(), Err(anyhow!("timeout"))),
        (Uuid::new_v4(), Err(anyhow!("timeout"))),
    ];

    assert_eq!(sum_partial("group", counts), 0);
}

#[test]
fn zero_memberships_sum_to_zero() {
    assert_eq!(sum_partial("channel", Vec::new()), 0);
}

#[test]
fn empty_badge_counts_are_all_zero() {
    let counts = BadgeCounts::empty();
    assert_eq!(counts.unread_messages, 0);
    assert_eq!(counts.unread_groups, 0);
    assert_eq!(counts.upcoming_events_today, 0);
    assert!(!counts.has_more_notifications);
}

//! Deep-Link Dispatch Tests
//!
//! Every notification type must resolve to a navigation target; unknown
//! or absent types fall back to the dashboard.

use uuid::Uuid;

use pulse::app::push::resolve_target;
use pulse::domain::notification::{NavigationTarget, NotificationType};

#[test]
fn dispatch_is_total_with_reference() {
    let reference = Uuid::new_v4();

    for kind in NotificationType::ALL {
        let target = resolve_target(Some(kind), Some(reference));
        assert!(
            !target.path().is_empty(),
            "{:?} resolved to an empty path",
            kind
        );
    }
}

#[test]
fn dispatch_is_total_without_reference() {
    for kind in NotificationType::ALL {
        let target = resolve_target(Some(kind), None);
        assert!(
            !target.path().is_empty(),
            "{:?} without reference resolved to an empty path",
            kind
        );
    }
}

#[test]
fn message_resolves_to_its_channel() {
    let reference = Uuid::new_v4();
    let target = resolve_target(Some(NotificationType::Message), Some(reference));

    assert_eq!(target, NavigationTarget::Channel(reference));
    assert_eq!(target.path(), format!("/channels/{}", reference));
}

#[test]
fn post_resolves_to_its_group() {
    let reference = Uuid::new_v4();
    let target = resolve_target(Some(NotificationType::Post), Some(reference));

    assert_eq!(target, NavigationTarget::Group(reference));
}

#[test]
fn list_view_types_ignore_references() {
    let reference = Uuid::new_v4();

    assert_eq!(
        resolve_target(Some(NotificationType::Score), Some(reference)),
        NavigationTarget::Scores
    );
    assert_eq!(
        resolve_target(Some(NotificationType::Assignment), Some(reference)),
        NavigationTarget::Assignments
    );
    assert_eq!(
        resolve_target(Some(NotificationType::MarketplaceItem), Some(reference)),
        NavigationTarget::Marketplace
    );
    assert_eq!(
        resolve_target(Some(NotificationType::Resource), Some(reference)),
        NavigationTarget::Marketplace
    );
    assert_eq!(
        resolve_target(Some(NotificationType::StaffTask), Some(reference)),
        NavigationTarget::Staff
    );
    assert_eq!(
        resolve_target(Some(NotificationType::StaffTimeOff), Some(reference)),
        NavigationTarget::Staff
    );
    assert_eq!(
        resolve_target(Some(NotificationType::Event), Some(reference)),
        NavigationTarget::Calendar
    );
    assert_eq!(
        resolve_target(Some(NotificationType::PrivateLesson), Some(reference)),
        NavigationTarget::PrivateLessons
    );
}

#[test]
fn reference_types_without_reference_fall_back_to_dashboard() {
    assert_eq!(
        resolve_target(Some(NotificationType::Message), None),
        NavigationTarget::Dashboard
    );
    assert_eq!(
        resolve_target(Some(NotificationType::Post), None),
        NavigationTarget::Dashboard
    );
    assert_eq!(
        resolve_target(Some(NotificationType::Competition), None),
        NavigationTarget::Dashboard
    );
}

#[test]
fn unknown_type_falls_back_to_dashboard() {
    assert_eq!(NotificationType::from_db("jousting"), None);
    assert_eq!(
        resolve_target(NotificationType::from_db("jousting"), Some(Uuid::new_v4())),
        NavigationTarget::Dashboard
    );
}

#[test]
fn type_names_round_trip_through_the_store_encoding() {
    for kind in NotificationType::ALL {
        assert_eq!(NotificationType::from_db(kind.as_db()), Some(kind));
    }
}

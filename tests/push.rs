//! Push Registration Tests
//!
//! Covers the preflight decision table and the per-device lifecycle
//! state machine.

use pulse::app::push::{preflight, DeviceReport, RegistrationOutcome};
use pulse::domain::push::{
    PermissionStatus, PushPlatformKind, RegistrationEvent, RegistrationPhase,
};

fn report(
    physical_device: bool,
    permission: PermissionStatus,
    token: Option<&str>,
) -> DeviceReport {
    DeviceReport {
        platform: PushPlatformKind::Ios,
        physical_device,
        permission,
        token: token.map(str::to_string),
    }
}

// ===========================================================================
// Preflight
// ===========================================================================

#[test]
fn simulator_is_silently_skipped() {
    let outcome = preflight(
        &report(false, PermissionStatus::Granted, Some("tok")),
        true,
    );
    assert_eq!(outcome, Some(RegistrationOutcome::Skipped));
}

#[test]
fn undetermined_permission_requests_a_prompt() {
    let outcome = preflight(&report(true, PermissionStatus::Undetermined, None), true);
    assert_eq!(outcome, Some(RegistrationOutcome::PermissionRequested));
}

#[test]
fn denied_permission_halts_registration() {
    let outcome = preflight(
        &report(true, PermissionStatus::Denied, Some("tok")),
        true,
    );
    assert_eq!(outcome, Some(RegistrationOutcome::Denied));
}

#[test]
fn missing_platform_identity_is_fatal_to_registration_only() {
    let outcome = preflight(
        &report(true, PermissionStatus::Granted, Some("tok")),
        false,
    );
    assert_eq!(outcome, Some(RegistrationOutcome::Unavailable));
}

#[test]
fn granted_without_a_token_is_unavailable() {
    let outcome = preflight(&report(true, PermissionStatus::Granted, None), true);
    assert_eq!(outcome, Some(RegistrationOutcome::Unavailable));
}

#[test]
fn granted_with_a_token_proceeds_to_binding() {
    let outcome = preflight(
        &report(true, PermissionStatus::Granted, Some("tok")),
        true,
    );
    assert_eq!(outcome, None);
}

// ===========================================================================
// Lifecycle state machine
// ===========================================================================

#[test]
fn full_registration_path_reaches_active() {
    let phase = RegistrationPhase::Unregistered
        .advance(RegistrationEvent::PermissionPrompted)
        .advance(RegistrationEvent::PermissionGranted)
        .advance(RegistrationEvent::TokenIssued)
        .advance(RegistrationEvent::Activated);

    assert_eq!(phase, RegistrationPhase::Active);
}

#[test]
fn denial_is_terminal_for_the_attempt() {
    let phase = RegistrationPhase::Unregistered
        .advance(RegistrationEvent::PermissionPrompted)
        .advance(RegistrationEvent::PermissionDenied);
    assert_eq!(phase, RegistrationPhase::Denied);

    // Token events cannot revive a denied device.
    assert_eq!(
        phase.advance(RegistrationEvent::TokenIssued),
        RegistrationPhase::Denied
    );
    assert_eq!(
        phase.advance(RegistrationEvent::Activated),
        RegistrationPhase::Denied
    );
}

#[test]
fn already_granted_permission_skips_the_prompt() {
    let phase =
        RegistrationPhase::Unregistered.advance(RegistrationEvent::PermissionGranted);
    assert_eq!(phase, RegistrationPhase::Granted);
}

#[test]
fn deregistration_clears_any_phase() {
    for phase in [
        RegistrationPhase::Unregistered,
        RegistrationPhase::PermissionRequested,
        RegistrationPhase::Granted,
        RegistrationPhase::Denied,
        RegistrationPhase::TokenIssued,
        RegistrationPhase::Active,
    ] {
        assert_eq!(
            phase.advance(RegistrationEvent::Deregistered),
            RegistrationPhase::Deregistered
        );
    }
}

#[test]
fn deregistered_device_can_register_again() {
    let phase = RegistrationPhase::Deregistered
        .advance(RegistrationEvent::PermissionGranted)
        .advance(RegistrationEvent::TokenIssued)
        .advance(RegistrationEvent::Activated);

    assert_eq!(phase, RegistrationPhase::Active);
}

#[test]
fn illegal_events_leave_the_phase_unchanged() {
    assert_eq!(
        RegistrationPhase::Unregistered.advance(RegistrationEvent::Activated),
        RegistrationPhase::Unregistered
    );
    assert_eq!(
        RegistrationPhase::Active.advance(RegistrationEvent::PermissionPrompted),
        RegistrationPhase::Active
    );
}

// ===========================================================================
// Outcome to lifecycle mapping
// ===========================================================================

#[test]
fn active_outcome_walks_the_machine_to_active() {
    let mut phase = RegistrationPhase::Unregistered;
    for event in RegistrationOutcome::Active.events() {
        phase = phase.advance(*event);
    }
    assert_eq!(phase, RegistrationPhase::Active);
}

#[test]
fn skipped_outcome_leaves_the_machine_untouched() {
    assert!(RegistrationOutcome::Skipped.events().is_empty());
}

use crate::session::SessionPhase;

/// **VALUE**: Verifies a new session starts idle and only bind/handshake count as starting.
#[test]
fn given_each_phase_when_checked_then_only_bind_and_handshake_are_starting() {
    // GIVEN / WHEN / THEN
    assert_eq!(SessionPhase::default(), SessionPhase::Idle);
    assert!(SessionPhase::AwaitingBind.is_starting());
    assert!(SessionPhase::AwaitingHandshake.is_starting());

    for phase in [
        SessionPhase::Idle,
        SessionPhase::Live,
        SessionPhase::Stopping,
        SessionPhase::Errored,
    ] {
        assert!(!phase.is_starting(), "{phase} should not be starting");
    }
}

/// **VALUE**: Verifies phase names used in state error messages.
#[test]
fn given_phases_when_displayed_then_lowercase_names() {
    assert_eq!(SessionPhase::AwaitingHandshake.to_string(), "awaiting handshake");
    assert_eq!(SessionPhase::Errored.to_string(), "errored");
}

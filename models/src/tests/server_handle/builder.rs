use crate::{CoordinationScope, ModelError, ServerHandleBuilder};

/// **VALUE**: Verifies that builder validation rejects zero ports.
///
/// **WHY THIS MATTERS**: Port 0 means "let the OS pick" at bind time; by
/// the time a handle exists, a concrete port must have been read back from
/// the listener. A zero-port handle is an address nobody can dial.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The ephemeral-port readback is skipped and 0 leaks into a handle
/// - Validation logic is accidentally removed or bypassed
#[test]
fn given_zero_port_when_building_server_handle_then_returns_validation_error() {
    // GIVEN: Builder with port set to zero
    let builder = ServerHandleBuilder::default()
        .with_port(0)
        .with_host("127.0.0.1")
        .with_mode(CoordinationScope::Shared)
        .with_reused(false);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    assert!(result.is_err());
    match result.unwrap_err() {
        ModelError::InvalidValue { what, reason, .. } => {
            assert_eq!(what, "port");
            assert!(reason.contains("non-zero"));
        }
        other => panic!("expected InvalidValue, got {other}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects missing hosts.
///
/// **WHY THIS MATTERS**: Handles are dialed as `http://{host}:{port}`;
/// without a host there is nothing to dial.
#[test]
fn given_missing_host_when_building_then_returns_validation_error() {
    // GIVEN: Builder without a host
    let builder = ServerHandleBuilder::default()
        .with_port(4000)
        .with_mode(CoordinationScope::Shared)
        .with_reused(true);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result.unwrap_err() {
        ModelError::MissingField { field, .. } => {
            assert_eq!(field, "host");
        }
        other => panic!("expected MissingField, got {other}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects empty hosts.
#[test]
fn given_empty_host_when_building_then_returns_validation_error() {
    let builder = ServerHandleBuilder::default()
        .with_port(4000)
        .with_host("")
        .with_mode(CoordinationScope::Isolated)
        .with_reused(false);

    let result = builder.build();

    match result.unwrap_err() {
        ModelError::InvalidValue { what, .. } => {
            assert_eq!(what, "host");
        }
        other => panic!("expected InvalidValue, got {other}"),
    }
}

/// **VALUE**: Verifies that builder validation requires a coordination scope.
///
/// **WHY THIS MATTERS**: The scope on a handle tells callers which lock
/// file their server is registered under. Defaulting it silently would hide
/// misconfigured call sites.
#[test]
fn given_missing_mode_when_building_then_returns_validation_error() {
    let builder = ServerHandleBuilder::default()
        .with_port(4000)
        .with_host("127.0.0.1")
        .with_reused(false);

    let result = builder.build();

    match result.unwrap_err() {
        ModelError::MissingField { field, .. } => {
            assert_eq!(field, "mode");
        }
        other => panic!("expected MissingField, got {other}"),
    }
}

/// **VALUE**: Verifies a fully specified builder produces a usable handle.
///
/// **WHY THIS MATTERS**: This is the happy path every successful
/// `ensure_server` call ends in; the handle must preserve exactly what was
/// passed and render a dialable base URL.
#[test]
fn given_complete_fields_when_building_then_handle_matches_inputs() {
    // GIVEN: Builder with every field provided
    let builder = ServerHandleBuilder::default()
        .with_port(4017)
        .with_host("127.0.0.1")
        .with_mode(CoordinationScope::Isolated)
        .with_reused(true);

    // WHEN: Building
    let handle = builder.build().unwrap();

    // THEN: The handle reflects the inputs and renders a dialable URL
    assert_eq!(handle.port, 4017);
    assert_eq!(handle.host, "127.0.0.1");
    assert_eq!(handle.mode, CoordinationScope::Isolated);
    assert!(handle.reused);
    assert_eq!(handle.base_url(), "http://127.0.0.1:4017");
}

use crate::{CoordinationScope, ModelError};

use std::str::FromStr;

/// **VALUE**: Verifies the wire spelling of coordination scopes.
///
/// **WHY THIS MATTERS**: The `mode` field travels through `/whoami` between
/// releases; `"shared"` and `"isolated"` are the protocol constants every
/// peer matches against.
#[test]
fn given_scopes_when_serializing_then_lowercase_names_are_used() {
    assert_eq!(
        serde_json::to_string(&CoordinationScope::Shared).unwrap(),
        "\"shared\""
    );
    assert_eq!(
        serde_json::to_string(&CoordinationScope::Isolated).unwrap(),
        "\"isolated\""
    );
}

/// **VALUE**: Verifies scopes parse back from config and CLI input.
#[test]
fn given_known_scope_names_when_parsing_then_scopes_round_trip() {
    assert_eq!(
        CoordinationScope::from_str("shared").unwrap(),
        CoordinationScope::Shared
    );
    assert_eq!(
        CoordinationScope::from_str("isolated").unwrap(),
        CoordinationScope::Isolated
    );
}

/// **VALUE**: Verifies unknown scope names are rejected with a clear error.
///
/// **WHY THIS MATTERS**: A typo in configuration must surface as a
/// validation failure at load time, not silently fall back to a default
/// that changes lock-file naming.
#[test]
fn given_unknown_scope_name_when_parsing_then_returns_validation_error() {
    // GIVEN: A misspelled scope from a config file
    let result = CoordinationScope::from_str("shred");

    // THEN: Parsing fails and names the offending value
    match result.unwrap_err() {
        ModelError::InvalidValue { what, reason, .. } => {
            assert_eq!(what, "coordination scope");
            assert!(reason.contains("shred"));
        }
        other => panic!("expected InvalidValue, got {other}"),
    }
}

/// **VALUE**: Verifies shared is the default scope.
///
/// **WHY THIS MATTERS**: Omitting `mode` everywhere must keep the widest
/// reuse behavior; defaulting to isolated would quietly multiply server
/// processes.
#[test]
fn given_no_explicit_scope_when_defaulting_then_shared_is_chosen() {
    assert_eq!(CoordinationScope::default(), CoordinationScope::Shared);
}

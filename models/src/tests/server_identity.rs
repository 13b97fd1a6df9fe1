use crate::{CoordinationScope, ServerIdentity};

/// **VALUE**: Verifies `/whoami` payloads parse with protocol casing.
///
/// **WHY THIS MATTERS**: Identity comparison is how a launcher decides to
/// reuse, coexist with, or ignore a live listener. A parsing drift here
/// turns every compatible peer into a stranger.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The camelCase renames are dropped
/// - `mode` stops accepting the lowercase protocol constants
#[test]
fn given_whoami_payload_when_deserializing_then_identity_fields_map() {
    // GIVEN: A reply from a live isolated-mode server
    let raw = r#"{
        "pid": 515,
        "appSignature": "harbormaster-99aabbcc",
        "apiVersion": "3",
        "startedAt": "2026-08-23T09:00:00Z",
        "mode": "isolated"
    }"#;

    // WHEN: Parsing it
    let identity: ServerIdentity = serde_json::from_str(raw).unwrap();

    // THEN: All identity claims land intact
    assert_eq!(identity.pid, 515);
    assert_eq!(identity.app_signature, "harbormaster-99aabbcc");
    assert_eq!(identity.api_version, "3");
    assert_eq!(identity.mode, CoordinationScope::Isolated);
}

/// **VALUE**: Verifies unrecognized `mode` values fail parsing.
///
/// **WHY THIS MATTERS**: A listener answering `/whoami` with a shape we do
/// not fully understand is a foreign server. Failing the parse (and thereby
/// treating it as foreign) is the safe interpretation; guessing a scope is
/// not.
#[test]
fn given_unknown_mode_when_deserializing_then_parsing_fails() {
    let raw = r#"{"pid":1,"appSignature":"x","apiVersion":"1","mode":"federated"}"#;

    let result = serde_json::from_str::<ServerIdentity>(raw);

    assert!(result.is_err());
}

/// **VALUE**: Verifies the serialized identity matches what probers parse.
#[test]
fn given_identity_when_serializing_then_wire_casing_holds() {
    let identity = ServerIdentity {
        pid: 77,
        app_signature: String::from("harbormaster-00112233"),
        api_version: String::from("1"),
        started_at: None,
        mode: CoordinationScope::Shared,
    };

    let body = serde_json::to_string(&identity).unwrap();

    assert!(body.contains("\"appSignature\""));
    assert!(body.contains("\"mode\":\"shared\""));
    assert!(!body.contains("startedAt"));
}

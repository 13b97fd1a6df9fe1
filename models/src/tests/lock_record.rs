use crate::LockRecord;

/// **VALUE**: Verifies that lock records parse the exact on-disk key casing.
///
/// **WHY THIS MATTERS**: Lock files are shared state between independent
/// processes, possibly built from different releases. Every reader and
/// writer must agree on `appSignature` / `apiVersion` / `startedAt` spelling.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A serde rename is dropped during refactoring
/// - Field casing silently drifts to snake_case
/// - New required fields break parsing of existing lock files
#[test]
fn given_camel_case_json_when_deserializing_lock_record_then_all_fields_map() {
    // GIVEN: A lock file body as another process would have written it
    let raw = r#"{
        "port": 4000,
        "pid": 4242,
        "appSignature": "harbormaster-1a2b3c4d",
        "apiVersion": "1",
        "startedAt": "2026-08-23T10:15:00Z"
    }"#;

    // WHEN: Parsing it
    let record: LockRecord = serde_json::from_str(raw).unwrap();

    // THEN: Every field lands where the protocol expects it
    assert_eq!(record.port, 4000);
    assert_eq!(record.pid, 4242);
    assert_eq!(record.app_signature, "harbormaster-1a2b3c4d");
    assert_eq!(record.api_version, "1");
    assert_eq!(record.started_at.as_deref(), Some("2026-08-23T10:15:00Z"));
}

/// **VALUE**: Verifies that records without a launch timestamp still parse.
///
/// **WHY THIS MATTERS**: Adoption paths write lock records for servers they
/// did not start, and those records legitimately omit `startedAt`. Rejecting
/// them would make every adopted server invisible to the next launch.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `startedAt` accidentally becomes a required field
/// - The serde default on the option is removed
#[test]
fn given_record_without_started_at_when_deserializing_then_field_is_none() {
    // GIVEN: A minimal record, as written after adopting a foreign launch
    let raw = r#"{"port":4001,"pid":99,"appSignature":"harbormaster-ffeeddcc","apiVersion":"2"}"#;

    // WHEN: Parsing it
    let record: LockRecord = serde_json::from_str(raw).unwrap();

    // THEN: The timestamp is simply absent
    assert_eq!(record.started_at, None);
}

/// **VALUE**: Verifies that extra fields in a lock file are tolerated.
///
/// **WHY THIS MATTERS**: A newer release may extend the record. Older
/// processes must keep reading the fields they know rather than erroring
/// out and stampeding into fresh launches.
#[test]
fn given_record_with_unknown_fields_when_deserializing_then_they_are_ignored() {
    // GIVEN: A record from some future release with an extra field
    let raw = r#"{"port":4000,"pid":7,"appSignature":"s","apiVersion":"1","flavor":"beta"}"#;

    // WHEN: Parsing it
    let record: LockRecord = serde_json::from_str(raw).unwrap();

    // THEN: Known fields survive, the unknown one is dropped
    assert_eq!(record.port, 4000);
    assert_eq!(record.pid, 7);
}

/// **VALUE**: Verifies the usability gate on zeroed records.
///
/// **WHY THIS MATTERS**: Adoption writes `pid: 0` breadcrumbs on purpose.
/// Treating those as trustworthy would make the coordinator probe port 0
/// or trust a process that cannot be liveness-checked.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The zero-pid guard is removed and breadcrumbs short-circuit discovery
/// - Port 0 records are handed to the prober
#[test]
fn given_zeroed_fields_when_checking_usability_then_record_is_not_usable() {
    let full = LockRecord {
        port: 4000,
        pid: 1234,
        app_signature: String::from("harbormaster-1a2b3c4d"),
        api_version: String::from("1"),
        started_at: None,
    };
    let adopted = LockRecord { pid: 0, ..full.clone() };
    let portless = LockRecord { port: 0, ..full.clone() };

    assert!(full.is_usable());
    assert!(!adopted.is_usable());
    assert!(!portless.is_usable());
}

/// **VALUE**: Verifies the serialized shape other processes will read.
///
/// **WHY THIS MATTERS**: Writing is the other half of the compatibility
/// contract checked by the parsing tests; an absent timestamp must be
/// omitted entirely, not written as `null`, to match what older readers
/// expect.
#[test]
fn given_record_when_serializing_then_keys_are_camel_case_and_absent_timestamp_is_omitted() {
    // GIVEN: A record written after a bind-conflict adoption
    let record = LockRecord {
        port: 4003,
        pid: 0,
        app_signature: String::from("harbormaster-1a2b3c4d"),
        api_version: String::from("1"),
        started_at: None,
    };

    // WHEN: Serializing it the way the lock store does
    let body = serde_json::to_string(&record).unwrap();

    // THEN: Wire casing holds and startedAt is not present at all
    assert!(body.contains("\"appSignature\""));
    assert!(body.contains("\"apiVersion\""));
    assert!(!body.contains("startedAt"));
    assert!(!body.contains("app_signature"));
}

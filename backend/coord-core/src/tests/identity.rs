// Unit tests for installation identity derivation

use crate::identity::Identity;

/// **VALUE**: Verifies that identity detection is deterministic within a process.
///
/// **WHY THIS MATTERS**: The signature is the process-wide constant every
/// reuse decision compares against. If two detections in the same process
/// disagreed, a process could fail to recognize its own server.
///
/// **BUG THIS CATCHES**: Would catch if the digest input picked up
/// something volatile (time, pid, random temp paths).
#[test]
fn given_same_inputs_when_detecting_twice_then_signatures_match() {
    // GIVEN / WHEN: Two detections with identical inputs
    let first = Identity::detect("harbormaster", "1");
    let second = Identity::detect("harbormaster", "1");

    // THEN: Both resolve to the same signature string
    assert_eq!(
        first.signature().to_string(),
        second.signature().to_string()
    );
}

/// **VALUE**: Verifies the digest is a fixed-width hex fragment.
///
/// **WHY THIS MATTERS**: The signature lands in lock file names; a digest
/// with unexpected characters or length would produce surprising filenames
/// and break comparisons against records written by other releases.
#[test]
fn given_detected_identity_then_digest_is_eight_hex_chars() {
    let identity = Identity::detect("harbormaster", "1");

    let digest = identity.signature().digest().to_string();

    assert_eq!(digest.len(), 8, "Digest should be truncated to 8 chars");
    assert!(
        digest.chars().all(|c| c.is_ascii_hexdigit()),
        "Digest should be lowercase hex, got: {digest}"
    );
}

/// **VALUE**: Verifies the silent fallback for a missing application name.
///
/// **WHY THIS MATTERS**: Identity derivation must never fail; a host that
/// cannot supply a display name still needs a stable signature.
#[test]
fn given_empty_app_name_when_detecting_then_fallback_name_used() {
    // GIVEN / WHEN: Detection without a usable name
    let identity = Identity::detect("", "2");

    // THEN: The fallback name is substituted, the digest still derived
    assert_eq!(identity.signature().name(), "app");
    assert!(!identity.signature().digest().is_empty());
}

/// **VALUE**: Verifies constructed identities pass their parts through untouched.
///
/// **WHY THIS MATTERS**: Tests build synthetic identities to simulate other
/// installations; any normalization here would make those simulations lie.
#[test]
fn given_explicit_identity_then_accessors_return_inputs() {
    let identity = Identity::new(
        models::AppSignature::new("otherapp", "deadbeef"),
        "7",
    );

    assert_eq!(identity.signature().to_string(), "otherapp-deadbeef");
    assert_eq!(identity.api_version(), "7");
}

// Unit tests for error module
// Tests Display formatting and the From conversions main() leans on

use crate::error::HarborError;

use common::ErrorLocation;

use coord_core::error::CoordError;
use coord_core::error::serve::ServeError;

use std::panic::Location;

/// **VALUE**: Verifies errors render with their prefix and source location.
///
/// **WHY THIS MATTERS**: These strings are what lands in the log and on
/// stderr when startup fails. Losing the location strips the only pointer
/// back into the code.
#[test]
fn given_harbor_error_when_displayed_then_prefixed_with_location() {
    // GIVEN: An error raised here
    let err = HarborError::Harbor {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Formatting for display
    let rendered = err.to_string();

    // THEN: Prefix, message, and a file:line:column marker
    assert!(rendered.starts_with("Harbormaster Error: Test"));
    assert!(rendered.contains("error.rs"), "should carry the raise site");
}

/// **VALUE**: Verifies coordination failures convert with their detail intact.
///
/// **BUG THIS CATCHES**: Would catch a From impl that discards the inner
/// message, which would reduce every startup failure to its variant name.
#[test]
fn given_serve_error_when_converted_then_coordination_variant() {
    // GIVEN: A fatal coordination error
    let inner = ServeError::Exhausted {
        message: String::from("two bind races lost"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Converting as `?` would
    let err = HarborError::from(inner);

    // THEN: The right variant, carrying the inner rendering
    assert!(matches!(err, HarborError::Coordination { .. }));
    assert!(err.to_string().contains("two bind races lost"));
}

/// **VALUE**: Verifies the coord-core umbrella error converts the same way.
///
/// **WHY THIS MATTERS**: Embedders holding a `CoordError` (the transparent
/// union coord-core exposes) must be able to `?` it straight into the
/// binary's error without unwrapping variants first.
#[test]
fn given_umbrella_error_when_converted_then_coordination_variant() {
    // GIVEN: A serve failure wrapped in the umbrella
    let inner: CoordError = ServeError::PortConflict {
        message: String::from("address claimed"),
        location: ErrorLocation::from(Location::caller()),
    }
    .into();

    // WHEN
    let err = HarborError::from(inner);

    // THEN: Transparent wrapping preserves the inner rendering
    assert!(matches!(err, HarborError::Coordination { .. }));
    assert!(err.to_string().contains("address claimed"));
}

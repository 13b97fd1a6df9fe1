// Unit tests for settings loading, saving, and validation

use crate::config::CoordSettings;

use models::CoordinationScope;

/// **VALUE**: Verifies the documented defaults.
///
/// **WHY THIS MATTERS**: Most deployments never write a settings file;
/// the defaults ARE the configuration. Port 4000, loopback host, and
/// shared scope are load-bearing constants of the coordination protocol.
#[test]
fn given_no_settings_file_then_defaults_apply() {
    let settings = CoordSettings::default();

    assert_eq!(settings.version, 1);
    assert_eq!(settings.server.preferred_port, 4000);
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.mode, CoordinationScope::Shared);
    assert!(!settings.diagnostics.dump_routes);
    assert_eq!(settings.identity.app_name, "harbormaster");
    assert_eq!(settings.identity.api_version, "1");
    assert!(settings.data_dir.is_none());
}

/// **VALUE**: Verifies loading from a directory without a settings file
/// yields defaults rather than an error.
#[test]
fn given_missing_file_when_loading_then_defaults_returned() {
    let dir = tempfile::tempdir().unwrap();

    let settings = CoordSettings::load(dir.path()).unwrap();

    assert_eq!(settings.server.preferred_port, 4000);
}

/// **VALUE**: Verifies settings survive a save/load round trip.
///
/// **BUG THIS CATCHES**: Would catch asymmetric serde attributes between
/// the two paths, or the atomic-rename dance leaving the temp file as the
/// only artifact.
#[test]
fn given_saved_settings_when_loading_then_round_trips() {
    // GIVEN: Non-default settings
    let dir = tempfile::tempdir().unwrap();
    let mut settings = CoordSettings::default();
    settings.server.preferred_port = 4777;
    settings.server.mode = CoordinationScope::Isolated;
    settings.diagnostics.dump_routes = true;

    // WHEN: Saving then loading
    settings.save(dir.path()).unwrap();
    let loaded = CoordSettings::load(dir.path()).unwrap();

    // THEN: The interesting fields survive
    assert_eq!(loaded.server.preferred_port, 4777);
    assert_eq!(loaded.server.mode, CoordinationScope::Isolated);
    assert!(loaded.diagnostics.dump_routes);

    // AND: No temp file is left behind
    assert!(!dir.path().join("harbormaster.json.tmp").exists());
}

/// **VALUE**: Verifies partial settings files pick up defaults for the rest.
///
/// **WHY THIS MATTERS**: Users write minimal overrides by hand; a file
/// containing only a port must not zero out the host or the scope.
#[test]
fn given_partial_settings_json_when_parsing_then_rest_defaults() {
    let raw = r#"{ "server": { "preferred_port": 4321 } }"#;

    let settings: CoordSettings = serde_json::from_str(raw).unwrap();

    assert_eq!(settings.server.preferred_port, 4321);
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.mode, CoordinationScope::Shared);
    assert_eq!(settings.version, 1);
}

/// **VALUE**: Verifies validation rejects a zero preferred port.
///
/// **WHY THIS MATTERS**: Port 0 in configuration would make every launch
/// land on a random ephemeral port, defeating cross-process discovery at
/// the preferred port entirely.
#[test]
fn given_zero_port_when_validating_then_rejected() {
    let mut settings = CoordSettings::default();
    settings.server.preferred_port = 0;

    assert!(settings.validate().is_err());
}

/// **VALUE**: Verifies validation rejects an empty host.
#[test]
fn given_empty_host_when_validating_then_rejected() {
    let mut settings = CoordSettings::default();
    settings.server.host = String::new();

    assert!(settings.validate().is_err());
}

/// **VALUE**: Verifies validation rejects an empty API version.
///
/// **WHY THIS MATTERS**: The API version keys shared-scope lock files;
/// empty would produce `server.shared.v.lock` shared by everything.
#[test]
fn given_empty_api_version_when_validating_then_rejected() {
    let mut settings = CoordSettings::default();
    settings.identity.api_version = String::new();

    assert!(settings.validate().is_err());
}

/// **VALUE**: Verifies unknown settings versions are rejected at load.
#[test]
fn given_future_version_when_validating_then_rejected() {
    let mut settings = CoordSettings::default();
    settings.version = 99;

    assert!(settings.validate().is_err());
}

/// **VALUE**: Verifies an explicit data_dir wins over the platform default.
#[test]
fn given_explicit_data_dir_then_resolution_uses_it() {
    let mut settings = CoordSettings::default();
    settings.data_dir = Some("/srv/harbormaster".into());

    assert_eq!(
        settings.resolve_data_dir(),
        std::path::PathBuf::from("/srv/harbormaster")
    );
}

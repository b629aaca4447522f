use crate::error::SettingsError;
use crate::settings::{EngineSettings, LauncherSettings, ListenSettings};
use crate::{DEFAULT_INTERNAL_HOST, PROXY_API_KEY_ENV, PROXY_BINARY};

use std::fs;

use tempfile::TempDir;

/// **VALUE**: Verifies a missing settings file yields defaults instead of an error.
///
/// **WHY THIS MATTERS**: A fresh install has no settings file. Failing here would stop
/// the host from ever starting.
#[test]
fn given_empty_dir_when_loaded_then_defaults() {
    // GIVEN: A directory without engine.json
    let dir = TempDir::new().unwrap();

    // WHEN: Loading
    let settings = EngineSettings::load(dir.path()).unwrap();

    // THEN: Defaults
    assert_eq!(settings, EngineSettings::default());
    assert_eq!(settings.internal_host, DEFAULT_INTERNAL_HOST);
    assert_eq!(settings.launcher.binary, PROXY_BINARY);
    assert_eq!(settings.launcher.api_key_env, PROXY_API_KEY_ENV);
}

/// **VALUE**: Verifies saved settings load back unchanged and no temp file is left behind.
///
/// **BUG THIS CATCHES**: Would catch if the rename step is skipped and the host keeps
/// reading a stale file, or if a field is missing its serde attribute.
#[test]
fn given_custom_settings_when_saved_and_loaded_then_identical() {
    // GIVEN: Non-default settings
    let dir = TempDir::new().unwrap();
    let settings = EngineSettings {
        graphql_paths: Some(vec!["/gql".into()]),
        listen: ListenSettings {
            port: Some("8443".into()),
            ..ListenSettings::default()
        },
        launcher: LauncherSettings {
            args: vec!["--verbose".into()],
            log_level: Some("debug".into()),
            ..LauncherSettings::default()
        },
        ..EngineSettings::default()
    };

    // WHEN: Saving then loading
    settings.save(dir.path()).unwrap();
    let loaded = EngineSettings::load(dir.path()).unwrap();

    // THEN: Same values, only engine.json in the directory
    assert_eq!(loaded, settings);
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["engine.json"]);
}

/// **VALUE**: Verifies a partial file is completed with defaults.
#[test]
fn given_partial_json_when_loaded_then_missing_fields_defaulted() {
    // GIVEN: Only a listen port
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("engine.json"),
        r#"{ "listen": { "port": "3000" } }"#,
    )
    .unwrap();

    // WHEN: Loading
    let settings = EngineSettings::load(dir.path()).unwrap();

    // THEN: Port kept, everything else default
    assert_eq!(settings.listen.port.as_deref(), Some("3000"));
    assert_eq!(settings.internal_host, DEFAULT_INTERNAL_HOST);
    assert!(settings.graphql_paths.is_none());
}

/// **VALUE**: Verifies malformed JSON is reported instead of silently replaced by defaults.
///
/// **WHY THIS MATTERS**: Falling back to defaults would start the proxy on a port the
/// operator never configured.
#[test]
fn given_malformed_json_when_loaded_then_parse_error() {
    // GIVEN: Broken JSON
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("engine.json"), "{ not json").unwrap();

    // WHEN
    let result = EngineSettings::load(dir.path());

    // THEN
    assert!(matches!(result, Err(SettingsError::ParseError { .. })));
}

/// **VALUE**: Verifies invalid values are rejected on load and on save.
#[test]
fn given_invalid_values_when_validated_then_validation_error() {
    // GIVEN: One invalid field per case
    let cases = [
        EngineSettings {
            version: 0,
            ..EngineSettings::default()
        },
        EngineSettings {
            internal_host: " ".into(),
            ..EngineSettings::default()
        },
        EngineSettings {
            graphql_paths: Some(Vec::new()),
            ..EngineSettings::default()
        },
        EngineSettings {
            graphql_paths: Some(vec!["graphql".into()]),
            ..EngineSettings::default()
        },
        EngineSettings {
            launcher: LauncherSettings {
                binary: String::new(),
                ..LauncherSettings::default()
            },
            ..EngineSettings::default()
        },
    ];

    // WHEN / THEN
    let dir = TempDir::new().unwrap();
    for settings in cases {
        assert!(
            matches!(settings.validate(), Err(SettingsError::ValidationError { .. })),
            "should reject {settings:?}"
        );
        assert!(settings.save(dir.path()).is_err());
    }
    assert!(!dir.path().join("engine.json").exists());
}

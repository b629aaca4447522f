use engine_core::PROXY_LOG_LEVEL_ENV;
use engine_core::proxy::LauncherOptions;
use engine_core::settings::LauncherSettings;

use serial_test::serial;

const TEST_KEY_ENV: &str = "ENGINE_TEST_PROXY_KEY";

fn settings() -> LauncherSettings {
    LauncherSettings {
        api_key_env: TEST_KEY_ENV.to_string(),
        log_level: Some("debug".to_string()),
        ..LauncherSettings::default()
    }
}

/// **VALUE**: Verifies the API key is read from the configured variable and stays redacted.
///
/// **WHY THIS MATTERS**: The key authenticates the proxy. Logging it in full through a
/// Debug print would leak it into every log file.
///
/// **BUG THIS CATCHES**: Would catch if the configured variable name is ignored, or if
/// the Debug output of the options contains the raw key.
#[test]
#[serial]
fn given_key_in_env_when_options_built_then_key_loaded_and_redacted() {
    // GIVEN
    unsafe { std::env::set_var(TEST_KEY_ENV, "  sk-live-abcdef123456  ") };

    // WHEN
    let options = LauncherOptions::from_settings(&settings());

    // THEN
    let key = options.api_key.as_ref().expect("key should be loaded");
    assert_eq!(key.expose(), "sk-live-abcdef123456");
    assert!(!format!("{options:?}").contains("sk-live-abcdef123456"));
    assert_eq!(options.api_key_env, TEST_KEY_ENV);
    assert!(
        options
            .env
            .contains(&(PROXY_LOG_LEVEL_ENV.to_string(), "debug".to_string()))
    );

    unsafe { std::env::remove_var(TEST_KEY_ENV) };
}

/// **VALUE**: Verifies a missing or blank key leaves the proxy without one.
#[test]
#[serial]
fn given_missing_or_blank_key_when_options_built_then_no_key() {
    // GIVEN / WHEN: Unset
    unsafe { std::env::remove_var(TEST_KEY_ENV) };
    let unset = LauncherOptions::from_settings(&settings());

    // GIVEN / WHEN: Whitespace only
    unsafe { std::env::set_var(TEST_KEY_ENV, "   ") };
    let blank = LauncherOptions::from_settings(&settings());
    unsafe { std::env::remove_var(TEST_KEY_ENV) };

    // THEN
    assert!(unset.api_key.is_none());
    assert!(blank.api_key.is_none());
}

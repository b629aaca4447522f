use crate::helpers::GreetingHandler;

use engine_core::error::{EngineError, ProxyError};
use engine_core::proxy::{LauncherOptions, ProcessLauncher, ProxyHandle, ProxyLauncher};
use engine_core::settings::EngineSettings;
use engine_core::{EngineSession, ListenOptions, SessionPhase};

use common::RedactedApiKey;
use models::{HandshakePayloadBuilder, ListenTarget, ListeningAddress};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

// ============================================================================
// ProcessLauncher against a scripted stand-in proxy
// The script is run through `sh` so no executable bit or build step is needed
// ============================================================================

const STUB_PORT: u16 = 45_123;
const WAIT: Duration = Duration::from_secs(10);

/// Stand-in proxy: stores its stdin payload and API key, prints noise and then
/// its URL, and keeps running until signalled.
const STUB_PROXY: &str = r#"
read -r payload
printf '%s\n' "$payload" > "$1"
printf '%s\n' "$ENGINE_API_KEY" > "$1.key"
echo "stub proxy booting"
echo "stub proxy listening on http://127.0.0.1:45123"
exec sleep 30
"#;

const EXITING_PROXY: &str = r#"
read -r payload
echo "invalid configuration" >&2
exit 3
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn sh_options(script: &Path, output: &Path) -> LauncherOptions {
    LauncherOptions {
        binary: "sh".to_string(),
        args: vec![
            script.to_string_lossy().into_owned(),
            output.to_string_lossy().into_owned(),
        ],
        ..LauncherOptions::default()
    }
}

/// **VALUE**: Verifies the launcher hands over the payload on stdin, passes the API key
/// through the environment, and parses the address out of noisy output.
///
/// **WHY THIS MATTERS**: This is the real wire contract with the proxy binary.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The payload is not newline terminated, so a line-reading proxy blocks forever
/// - Log lines before the URL are mistaken for the address
/// - The API key is not exported to the child
#[tokio::test]
async fn given_stub_proxy_when_started_then_payload_delivered_and_address_parsed() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "proxy.sh", STUB_PROXY);
    let output = dir.path().join("payload.json");
    let options = LauncherOptions {
        api_key: Some(RedactedApiKey::new("sk-stub-987654321")),
        ..sh_options(&script, &output)
    };
    let payload = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::tcp("0.0.0.0", 8080))
        .with_origin_url("http://127.0.0.1:50000")
        .build()
        .unwrap();

    // WHEN
    let handle = timeout(WAIT, ProcessLauncher.start(&payload, &options))
        .await
        .unwrap()
        .unwrap();

    // THEN
    assert_eq!(
        handle.listening_address(),
        &ListeningAddress::new("127.0.0.1", STUB_PORT)
    );

    let written = fs::read_to_string(&output).unwrap();
    let json: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
    assert_eq!(json["frontendHost"], "0.0.0.0");
    assert_eq!(json["frontendPort"], 8080);
    assert_eq!(json["originUrl"], "http://127.0.0.1:50000");

    let key = fs::read_to_string(dir.path().join("payload.json.key")).unwrap();
    assert_eq!(key.trim(), "sk-stub-987654321");

    timeout(WAIT, handle.stop()).await.unwrap().unwrap();
}

/// **VALUE**: Verifies a proxy that exits without an address is reported as rejected.
#[tokio::test]
async fn given_proxy_exiting_early_when_started_then_rejected_error() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "exit.sh", EXITING_PROXY);
    let options = sh_options(&script, &dir.path().join("unused"));
    let payload = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::pipe(r"\\.\pipe\x"))
        .with_origin_url("http://127.0.0.1:50001")
        .build()
        .unwrap();

    // WHEN
    let result = timeout(WAIT, ProcessLauncher.start(&payload, &options))
        .await
        .unwrap();

    // THEN
    assert!(matches!(result, Err(ProxyError::Rejected { .. })));
}

/// **VALUE**: Verifies a missing proxy binary is a spawn error, not a hang or panic.
#[tokio::test]
async fn given_missing_binary_when_started_then_spawn_error() {
    // GIVEN
    let options = LauncherOptions {
        binary: "engine-proxy-that-does-not-exist".to_string(),
        ..LauncherOptions::default()
    };
    let payload = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::tcp("0.0.0.0", 1))
        .with_origin_url("http://127.0.0.1:2")
        .build()
        .unwrap();

    // WHEN
    let result = ProcessLauncher.start(&payload, &options).await;

    // THEN
    assert!(matches!(result, Err(ProxyError::Spawn { .. })));
}

/// **VALUE**: End to end: a session with the process launcher goes live and stops cleanly.
///
/// **BUG THIS CATCHES**: Would catch if the session and the launcher disagree on who owns
/// the child process, leaving the proxy running after `stop()`.
#[tokio::test]
async fn given_session_with_process_launcher_when_listen_and_stop_then_live_then_idle() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "proxy.sh", STUB_PROXY);
    let output = dir.path().join("payload.json");
    let session = EngineSession::new(
        EngineSettings::default(),
        Arc::new(ProcessLauncher),
        sh_options(&script, &output),
    );

    // WHEN
    let pending = session
        .listen(ListenOptions::default().with_port(8080).with_handler(Arc::new(GreetingHandler)))
        .unwrap();
    let address = timeout(WAIT, pending.ready()).await.unwrap().unwrap();

    // THEN
    assert_eq!(address, ListeningAddress::new("127.0.0.1", STUB_PORT));
    assert_eq!(session.phase(), SessionPhase::Live);

    let result: Result<(), EngineError> = timeout(WAIT, session.stop()).await.unwrap();
    result.unwrap();
    assert_eq!(session.phase(), SessionPhase::Idle);
}

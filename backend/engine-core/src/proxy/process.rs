use crate::error::ProxyError;
use crate::proxy::{LauncherOptions, ProxyHandle, ProxyLauncher};

use common::ErrorLocation;
use models::{HandshakePayload, ListeningAddress};

use std::env::current_exe;
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};
use regex::Regex;
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child as TokioChild, ChildStdout, Command as TokioCommand};
use tokio::spawn as TokioSpawn;
use tokio::task::JoinHandle;
use tokio::time::sleep as TokioSleep;

const PROXY_MAX_OUTPUT_LINES: usize = 100;
const STOP_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(5);
/// Bracketed IPv6 hosts keep their brackets so the address stays a valid authority.
const PROXY_URL_PATTERN: &str = r"https?://(?P<host>\[[^\]\s/]+\]|[^\s:/\[\]]+):(?P<port>\d+)";
const URL_CAPTURE_HOST: &str = "host";
const URL_CAPTURE_PORT: &str = "port";

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(PROXY_URL_PATTERN).expect("valid regex pattern"))
}

pub(crate) fn build_proxy_command(program: &str, options: &LauncherOptions) -> TokioCommand {
    let mut cmd = TokioCommand::new(program);
    cmd.args(&options.args)
        .envs(options.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(key) = &options.api_key {
        cmd.env(&options.api_key_env, key.expose());
    }

    cmd
}

/// Parse one line of proxy output into the address it reports, if any.
pub(crate) fn parse_listening_line(line: &str) -> Option<ListeningAddress> {
    let caps = get_url_regex().captures(line)?;
    let host = caps.name(URL_CAPTURE_HOST)?.as_str();
    let port_str = caps.name(URL_CAPTURE_PORT)?.as_str();

    match port_str.parse::<u16>() {
        Ok(port) => Some(ListeningAddress::new(host, port)),
        Err(e) => {
            warn!("Failed to parse proxy port '{port_str}': {e}");
            None
        }
    }
}

/// [`ProxyLauncher`] that runs the proxy as a child process.
///
/// The payload is written to the child's stdin as one JSON line. The proxy is
/// expected to print its public URL (`http://host:port`) on stdout once it
/// accepts traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl ProxyLauncher for ProcessLauncher {
    async fn start(
        &self,
        payload: &HandshakePayload,
        options: &LauncherOptions,
    ) -> Result<Box<dyn ProxyHandle>, ProxyError> {
        let mut encoded = serde_json::to_vec(payload).map_err(|e| ProxyError::Write {
            message: format!("Failed to encode handshake payload: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;
        encoded.push(b'\n');

        info!(
            "Starting proxy {} for origin {}",
            options.binary,
            payload.origin_url()
        );

        let mut child = spawn_proxy_process(options)?;

        if let Err(e) = write_payload(&mut child, &encoded).await {
            let _ = child.kill().await;
            return Err(e);
        }

        let (lines, address) = match read_listening_address(&mut child).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Proxy never reported an address, killing (PID: {:?})", child.id());
                let _ = child.kill().await;
                return Err(e);
            }
        };

        let pid = child.id();
        info!("Proxy listening on {address} (PID: {pid:?})");

        let drain = TokioSpawn(drain_stdout(lines));

        Ok(Box::new(ProcessProxyHandle {
            child,
            pid,
            address,
            drain,
        }))
    }
}

fn spawn_proxy_process(options: &LauncherOptions) -> Result<TokioChild, ProxyError> {
    debug!("Attempting to spawn {} from PATH", options.binary);

    match build_proxy_command(&options.binary, options).spawn() {
        Ok(child) => {
            debug!("Spawned {} (PID: {:?})", options.binary, child.id());
            Ok(child)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("{} not in PATH, trying next to the executable", options.binary);
            spawn_local_binary(options)
        }
        Err(err) => Err(ProxyError::Spawn {
            message: format!("Failed to spawn {}: {err}", options.binary),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(err),
        }),
    }
}

fn spawn_local_binary(options: &LauncherOptions) -> Result<TokioChild, ProxyError> {
    let exe = current_exe().map_err(|e| ProxyError::Spawn {
        message: format!("Failed to get current executable path: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })?;

    let dir = exe.parent().ok_or_else(|| ProxyError::Spawn {
        message: format!("Executable has no parent directory: {}", exe.display()),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::NotFound, "no parent dir")),
    })?;

    let local_path = dir.join(&options.binary);
    debug!("Attempting to spawn from {}", local_path.display());

    build_proxy_command(&local_path.to_string_lossy(), options)
        .current_dir(dir)
        .spawn()
        .map_err(|e| ProxyError::Spawn {
            message: format!(
                "Failed to spawn {} from {}: {e}",
                options.binary,
                local_path.display()
            ),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })
}

async fn write_payload(child: &mut TokioChild, encoded: &[u8]) -> Result<(), ProxyError> {
    let mut stdin = child.stdin.take().ok_or_else(|| ProxyError::Write {
        message: "Proxy process has no stdin".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::BrokenPipe, "stdin not piped")),
    })?;

    stdin.write_all(encoded).await.map_err(|e| ProxyError::Write {
        message: format!("Failed to write handshake payload: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })?;

    // The proxy reads its payload until EOF.
    stdin.shutdown().await.map_err(|e| ProxyError::Write {
        message: format!("Failed to close proxy stdin: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })?;

    trace!("Handshake payload written ({} bytes)", encoded.len());
    Ok(())
}

async fn read_listening_address(
    child: &mut TokioChild,
) -> Result<(Lines<BufReader<ChildStdout>>, ListeningAddress), ProxyError> {
    let stdout = child.stdout.take().ok_or_else(|| ProxyError::Parse {
        message: "Proxy process has no stdout".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    if let Some(stderr) = child.stderr.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                trace!("Proxy stderr: {line}");
            }
        });
    }

    let mut lines = BufReader::new(stdout).lines();

    for _ in 0..PROXY_MAX_OUTPUT_LINES {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!("Proxy output: {line}");

                if let Some(address) = parse_listening_line(&line) {
                    return Ok((lines, address));
                }
            }
            Ok(None) => {
                let status = child.wait().await.ok();
                return Err(ProxyError::Rejected {
                    message: format!("Proxy exited before reporting an address (status: {status:?})"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(e) => {
                return Err(ProxyError::Parse {
                    message: format!("Failed to read proxy output: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    Err(ProxyError::Parse {
        message: format!("No listening URL in first {PROXY_MAX_OUTPUT_LINES} lines of proxy output"),
        location: ErrorLocation::from(Location::caller()),
    })
}

async fn drain_stdout(mut lines: Lines<BufReader<ChildStdout>>) {
    while let Ok(Some(line)) = lines.next_line().await {
        trace!("Proxy output: {line}");
    }
}

/// Ask the process to terminate gracefully. Returns whether a signal was sent.
fn request_termination(pid: u32) -> bool {
    let target = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

    match sys.process(target).map(|p| p.kill_with(Signal::Term)) {
        Some(Some(sent)) => {
            debug!("Sent SIGTERM to proxy PID {pid}: success={sent}");
            sent
        }
        Some(None) => {
            debug!("SIGTERM unsupported on this platform for PID {pid}");
            false
        }
        None => {
            debug!("Proxy PID {pid} not found");
            false
        }
    }
}

struct ProcessProxyHandle {
    child: TokioChild,
    pid: Option<u32>,
    address: ListeningAddress,
    drain: JoinHandle<()>,
}

impl ProcessProxyHandle {
    /// Poll for exit with exponential backoff. Returns true once exited.
    async fn wait_for_exit(&mut self) -> Result<bool, ProxyError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(STOP_VERIFY_MAX_ELAPSED),
            ..Default::default()
        };

        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Proxy exited with {status}");
                    return Ok(true);
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(ProxyError::Stop {
                        message: format!("Failed to query proxy status: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Proxy still running, retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => return Ok(false),
            }
        }
    }
}

#[async_trait]
impl ProxyHandle for ProcessProxyHandle {
    fn listening_address(&self) -> &ListeningAddress {
        &self.address
    }

    async fn stop(mut self: Box<Self>) -> Result<(), ProxyError> {
        info!("Stopping proxy on {} (PID: {:?})", self.address, self.pid);

        let terminated = match self.pid {
            Some(pid) if request_termination(pid) => self.wait_for_exit().await?,
            _ => false,
        };

        if !terminated {
            warn!("Proxy did not exit gracefully, killing (PID: {:?})", self.pid);
            self.child.kill().await.map_err(|e| ProxyError::Stop {
                message: format!("Failed to kill proxy: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        self.drain.abort();
        info!("Proxy on {} stopped", self.address);
        Ok(())
    }
}

use engine_host::error::HostError;
use engine_host::logger::initialize as LoggerInitialize;
use engine_host::status::StatusHandler;
use engine_host::{APP_NAME, DEFAULT_PORT};

use engine_core::settings::{EngineSettings, ListenSettings};
use engine_core::{EngineSession, ListenOptions, PortSpec};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};
use tokio::signal::ctrl_c;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), HostError> {
    let config_dir = EngineSettings::default_dir(APP_NAME).map_err(|e| HostError::Settings {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let log_dir = config_dir.join("logs");
    create_dir_all(&log_dir).map_err(|e| HostError::Host {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Logger first so settings problems are recorded
    LoggerInitialize(&log_dir)?;

    info!("Engine host starting");
    info!("Config directory: {}", config_dir.display());

    let settings = EngineSettings::load(&config_dir).map_err(|e| HostError::Settings {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;
    let listen = settings.listen.clone();

    let session = EngineSession::with_process_launcher(settings);
    let handler = Arc::new(StatusHandler::new(session.clone()));

    let options = listen_options(listen)
        .with_handler(handler)
        .on_ready(|address| info!("Public address: {address}"));

    let pending = session.listen(options).map_err(session_error)?;
    pending.ready().await.map_err(session_error)?;

    info!("Serving; press Ctrl-C to stop");
    ctrl_c().await.map_err(|e| HostError::Host {
        message: format!("Failed to wait for Ctrl-C: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Shutdown requested");
    session.stop().await.map_err(session_error)?;
    info!("Engine host stopped");
    Ok(())
}

fn listen_options(listen: ListenSettings) -> ListenOptions {
    let ListenSettings {
        port,
        pipe_path,
        host,
    } = listen;

    let port = match (port, &pipe_path) {
        (Some(port), _) => Some(PortSpec::from(port)),
        (None, None) => Some(PortSpec::from(DEFAULT_PORT)),
        (None, Some(_)) => None,
    };

    ListenOptions {
        port,
        pipe_path,
        host,
        ..ListenOptions::default()
    }
}

fn session_error(e: engine_core::EngineError) -> HostError {
    HostError::Session {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

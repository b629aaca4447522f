//! Boundary to the external proxy process.
//!
//! The engine never reimplements the proxy. It hands a
//! [`HandshakePayload`] to a [`ProxyLauncher`] and keeps the returned
//! [`ProxyHandle`] until the session stops.

pub mod process;

pub use process::ProcessLauncher;

use crate::error::ProxyError;
use crate::settings::LauncherSettings;
use crate::{PROXY_API_KEY_ENV, PROXY_BINARY, PROXY_LOG_LEVEL_ENV};

use common::RedactedApiKey;
use models::{HandshakePayload, ListeningAddress};

use std::env;

use async_trait::async_trait;
use log::{debug, info};

/// Starts the proxy collaborator.
#[async_trait]
pub trait ProxyLauncher: Send + Sync {
    /// Start a proxy configured by `payload`.
    ///
    /// Resolves once the proxy reported the address it accepts public
    /// traffic on.
    async fn start(
        &self,
        payload: &HandshakePayload,
        options: &LauncherOptions,
    ) -> Result<Box<dyn ProxyHandle>, ProxyError>;
}

/// A running proxy.
#[async_trait]
pub trait ProxyHandle: Send {
    fn listening_address(&self) -> &ListeningAddress;

    /// Stop the proxy. Consumes the handle; a proxy is stopped at most once.
    async fn stop(self: Box<Self>) -> Result<(), ProxyError>;
}

/// Passthrough options for the launcher, opaque to the lifecycle controller.
#[derive(Debug, Clone)]
pub struct LauncherOptions {
    pub binary: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub api_key: Option<RedactedApiKey>,
    pub api_key_env: String,
}

impl Default for LauncherOptions {
    fn default() -> Self {
        Self {
            binary: PROXY_BINARY.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            api_key: None,
            api_key_env: PROXY_API_KEY_ENV.to_string(),
        }
    }
}

impl LauncherOptions {
    /// Options from settings, with the API key read from the environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_settings(settings: &LauncherSettings) -> Self {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded .env from: {}", path.display()),
            Err(e) => debug!("No .env loaded: {e}"),
        }

        let api_key = env::var(&settings.api_key_env)
            .ok()
            .map(RedactedApiKey::new)
            .filter(|key| !key.is_empty());

        match &api_key {
            Some(key) => debug!("Proxy API key {key} read from {}", settings.api_key_env),
            None => debug!("No proxy API key in {}", settings.api_key_env),
        }

        let env = settings
            .log_level
            .as_ref()
            .map(|level| vec![(PROXY_LOG_LEVEL_ENV.to_string(), level.clone())])
            .unwrap_or_default();

        Self {
            binary: settings.binary.clone(),
            args: settings.args.clone(),
            env,
            api_key,
            api_key_env: settings.api_key_env.clone(),
        }
    }
}

use crate::error::model_error::ModelError;
use crate::{EphemeralBindResult, ErrorLocation, FrontendEndpoint, HandshakePayload, ListenTarget};

use std::panic::Location;

/// Path the proxy treats as GraphQL when the caller configures none.
pub const DEFAULT_GRAPHQL_PATH: &str = "/graphql";

const ORIGIN_SCHEME: &str = "http://";

/// Builder for validated [`HandshakePayload`] instances.
#[derive(Debug, Default)]
pub struct HandshakePayloadBuilder {
    frontend: Option<FrontendEndpoint>,
    graphql_paths: Option<Vec<String>>,
    origin_url: Option<String>,
}

impl HandshakePayloadBuilder {
    pub fn with_listen_target(mut self, target: &ListenTarget) -> Self {
        self.frontend = Some(FrontendEndpoint::from(target));
        self
    }

    pub fn with_frontend(mut self, frontend: FrontendEndpoint) -> Self {
        self.frontend = Some(frontend);
        self
    }

    pub fn with_graphql_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.graphql_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_origin(mut self, bind: &EphemeralBindResult) -> Self {
        self.origin_url = Some(bind.origin_url());
        self
    }

    pub fn with_origin_url(mut self, url: impl Into<String>) -> Self {
        self.origin_url = Some(url.into());
        self
    }

    /// Build the payload. Unset GraphQL paths fall back to [`DEFAULT_GRAPHQL_PATH`].
    #[track_caller]
    pub fn build(self) -> Result<HandshakePayload, ModelError> {
        let frontend = self.frontend.ok_or_else(|| ModelError::Validation {
            field: "frontend",
            message: String::from("A frontend port or pipe path is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        match &frontend {
            FrontendEndpoint::Tcp { host, .. } if host.is_empty() => {
                return Err(ModelError::Validation {
                    field: "frontendHost",
                    message: String::from("Frontend host cannot be empty"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            FrontendEndpoint::Pipe { pipe_path } if pipe_path.is_empty() => {
                return Err(ModelError::Validation {
                    field: "frontendPipePath",
                    message: String::from("Frontend pipe path cannot be empty"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            _ => {}
        }

        let graphql_paths = self
            .graphql_paths
            .unwrap_or_else(|| vec![DEFAULT_GRAPHQL_PATH.to_string()]);

        if graphql_paths.is_empty() {
            return Err(ModelError::Validation {
                field: "graphqlPaths",
                message: String::from("At least one GraphQL path is required"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if let Some(bad) = graphql_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(ModelError::Validation {
                field: "graphqlPaths",
                message: format!("GraphQL path must start with '/': {bad}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let origin_url = self.origin_url.ok_or_else(|| ModelError::Validation {
            field: "originUrl",
            message: String::from("Origin URL is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !origin_url.starts_with(ORIGIN_SCHEME) || origin_url.len() == ORIGIN_SCHEME.len() {
            return Err(ModelError::Validation {
                field: "originUrl",
                message: format!("Invalid origin URL format: {origin_url}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(HandshakePayload {
            frontend,
            graphql_paths,
            origin_url,
            use_frontend_path_for_default_origin: true,
        })
    }
}

//! Status endpoint the host serves behind the proxy.
//!
//! Each connection is driven by hyper's HTTP/1 server. Every request gets a
//! `200 OK` JSON body describing the session, whatever its method or path.

use engine_core::EngineSession;
use engine_core::server::ConnectionHandler;

use models::ListeningAddress;

use std::convert::Infallible;
use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1::Builder as Http1Builder;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use log::{debug, warn};
use serde::Serialize;
use tokio::net::TcpStream;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    pub session_id: String,
    pub phase: String,
    pub public_address: Option<ListeningAddress>,
}

impl HostStatus {
    pub fn of(session: &EngineSession) -> Self {
        Self {
            session_id: session.id().to_string(),
            phase: session.phase().to_string(),
            public_address: session.public_address(),
        }
    }
}

/// JSON response carrying `status`. hyper fills in `Content-Length`.
pub fn status_response(status: &HostStatus) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(status).unwrap_or_else(|e| {
        warn!("Failed to encode status: {e}");
        b"{}".to_vec()
    });

    let mut response = Response::new(Full::new(Bytes::from(body)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

pub struct StatusHandler {
    session: EngineSession,
}

impl StatusHandler {
    pub fn new(session: EngineSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ConnectionHandler for StatusHandler {
    async fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        let session = self.session.clone();
        let service = service_fn(move |request: Request<Incoming>| {
            debug!(
                "Status request from {peer}: {} {}",
                request.method(),
                request.uri()
            );
            let response = status_response(&HostStatus::of(&session));
            async move { Ok::<_, Infallible>(response) }
        });

        if let Err(e) = Http1Builder::new()
            .serve_connection(TokioIo::new(stream), service)
            .await
        {
            debug!("Status connection from {peer} ended: {e}");
        }
    }
}

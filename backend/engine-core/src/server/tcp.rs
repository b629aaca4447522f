use crate::server::{ConnectionHandler, RequestServer};

use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::{debug, error, info, trace};
use tokio::net::TcpListener;
use tokio::spawn as TokioSpawn;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct Running {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_loop: JoinHandle<()>,
}

/// [`RequestServer`] backed by a tokio `TcpListener`.
///
/// Each accepted connection is handed to the handler on its own task.
/// Connections already handed off keep running after `close()`.
pub struct TcpRequestServer {
    handler: Arc<dyn ConnectionHandler>,
    running: Mutex<Option<Running>>,
}

impl TcpRequestServer {
    pub fn new(handler: Arc<dyn ConnectionHandler>) -> Self {
        Self {
            handler,
            running: Mutex::new(None),
        }
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RequestServer for TcpRequestServer {
    async fn listen(&self, host: &str, port: u16) -> IoResult<()> {
        let existing = self.address();
        if let Some(existing) = existing {
            return Err(IoError::new(
                ErrorKind::AddrInUse,
                format!("server is already listening on {existing}"),
            ));
        }

        let listener = TcpListener::bind((host, port)).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handler = Arc::clone(&self.handler);

        let accept_loop = TokioSpawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            trace!("Accepted connection from {peer} on {local_addr}");
                            let handler = Arc::clone(&handler);
                            TokioSpawn(async move { handler.handle(stream, peer).await });
                        }
                        Err(e) => {
                            error!("Accept failed on {local_addr}: {e}");
                            break;
                        }
                    }
                }
            }

            debug!("Accept loop on {local_addr} stopped");
        });

        let mut running = self.running();
        if running.is_some() {
            accept_loop.abort();
            return Err(IoError::new(
                ErrorKind::AddrInUse,
                "server started listening concurrently",
            ));
        }

        *running = Some(Running {
            local_addr,
            shutdown: shutdown_tx,
            accept_loop,
        });

        info!("Request server listening on {local_addr}");
        Ok(())
    }

    fn address(&self) -> Option<SocketAddr> {
        self.running().as_ref().map(|r| r.local_addr)
    }

    async fn close(&self) -> IoResult<()> {
        let running = self.running().take().ok_or_else(|| {
            IoError::new(ErrorKind::NotConnected, "server is not listening")
        })?;

        let _ = running.shutdown.send(true);
        running.accept_loop.await.map_err(IoError::other)?;

        info!("Request server on {} closed", running.local_addr);
        Ok(())
    }
}

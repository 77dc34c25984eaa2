//! TCP socket server used by the `mina` and `hornetq` transports.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::service::TaskService;

use super::handler::{ConnectionHandler, StatusHandler};
use super::{Endpoint, ShutdownToken, TRANSPORT_TARGET, TaskServer, TransportError, TransportKind};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Socket server bound to a TCP endpoint.
pub(crate) struct SocketServer {
    kind: TransportKind,
    endpoint: Endpoint,
    listener: TcpListener,
    local_addr: SocketAddr,
    stopped: AtomicBool,
    handler: Arc<dyn ConnectionHandler>,
}

impl SocketServer {
    /// Binds `endpoint` and prepares the listener for non-blocking accepts.
    pub(crate) fn bind(
        kind: TransportKind,
        endpoint: &Endpoint,
        service: Arc<TaskService>,
    ) -> Result<Self, TransportError> {
        let handler = Arc::new(StatusHandler::new(kind, service));
        Self::bind_with_handler(kind, endpoint, handler)
    }

    fn bind_with_handler(
        kind: TransportKind,
        endpoint: &Endpoint,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<Self, TransportError> {
        let listener = bind_tcp(endpoint.host(), endpoint.port())?;
        listener
            .set_nonblocking(true)
            .map_err(|source| TransportError::NonBlocking { source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::NonBlocking { source })?;
        Ok(Self {
            kind,
            endpoint: endpoint.clone(),
            listener,
            local_addr,
            stopped: AtomicBool::new(false),
            handler,
        })
    }

    fn should_run(&self, token: &ShutdownToken) -> bool {
        !token.is_cancelled() && !self.stopped.load(Ordering::SeqCst)
    }

    fn accept_connection(&self) -> io::Result<Option<TcpStream>> {
        match self.listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(stream))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl TaskServer for SocketServer {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn describe(&self) -> String {
        format!("host {} port {}", self.endpoint.host(), self.endpoint.port())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }

    fn serve(&self, token: &ShutdownToken) -> Result<(), TransportError> {
        info!(
            target: TRANSPORT_TARGET,
            transport = %self.kind,
            endpoint = %self.endpoint,
            "socket listener active"
        );
        let mut last_error = None::<io::ErrorKind>;
        while self.should_run(token) {
            match self.accept_connection() {
                Ok(Some(stream)) => {
                    last_error = None;
                    let handler = Arc::clone(&self.handler);
                    thread::spawn(move || handler.handle(stream));
                }
                Ok(None) => thread::sleep(ACCEPT_BACKOFF),
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(
                            target: TRANSPORT_TARGET,
                            transport = %self.kind,
                            error = %error,
                            "socket accept error"
                        );
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        debug!(
            target: TRANSPORT_TARGET,
            transport = %self.kind,
            "socket listener stopped"
        );
        Ok(())
    }

    fn stop(&self) -> Result<(), TransportError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, TransportError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| TransportError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| TransportError::BindTcp { addr, source })
}

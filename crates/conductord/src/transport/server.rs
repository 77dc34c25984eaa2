//! Task server contract and the provider that builds servers.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::service::TaskService;

use super::queue::{PropertyNamingContext, QueueServer};
use super::socket::SocketServer;
use super::{ShutdownToken, TransportError, TransportKind, TransportSettings};

/// A transport server exposing the task service.
pub trait TaskServer: Send + Sync {
    /// Transport implemented by this server.
    fn kind(&self) -> TransportKind;

    /// Human-readable description of where the server listens.
    fn describe(&self) -> String;

    /// Bound socket address, for socket transports.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Runs the serve loop until `token` is cancelled or [`Self::stop`] is
    /// called.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the loop cannot continue.
    fn serve(&self, token: &ShutdownToken) -> Result<(), TransportError>;

    /// Asks the server to stop serving.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Stop`] when the server refuses to stop.
    fn stop(&self) -> Result<(), TransportError>;
}

/// Builds the server for a selected transport.
pub trait TransportProvider: Send + Sync {
    /// Constructs a server for `settings` over `service`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the server cannot be constructed.
    fn build(
        &self,
        settings: &TransportSettings,
        service: Arc<TaskService>,
    ) -> Result<Arc<dyn TaskServer>, TransportError>;
}

impl<T> TransportProvider for Arc<T>
where
    T: TransportProvider + ?Sized,
{
    fn build(
        &self,
        settings: &TransportSettings,
        service: Arc<TaskService>,
    ) -> Result<Arc<dyn TaskServer>, TransportError> {
        (**self).build(settings, service)
    }
}

/// Provider building TCP socket servers and the queue server.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTransportProvider;

impl TransportProvider for DefaultTransportProvider {
    fn build(
        &self,
        settings: &TransportSettings,
        service: Arc<TaskService>,
    ) -> Result<Arc<dyn TaskServer>, TransportError> {
        match settings {
            TransportSettings::Mina(endpoint) | TransportSettings::HornetQ(endpoint) => {
                let server = SocketServer::bind(settings.kind(), endpoint, service)?;
                Ok(Arc::new(server))
            }
            TransportSettings::Jms(jms) => {
                let naming = PropertyNamingContext::new(jms.bindings.clone());
                let server = QueueServer::connect(jms, &naming, service)?;
                Ok(Arc::new(server))
            }
        }
    }
}

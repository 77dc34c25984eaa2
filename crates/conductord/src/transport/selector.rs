//! Transport selection and the handle owning the running server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use conductor_config::PropertyStore;

use crate::service::TaskService;

use super::settings::{ACTIVE_CONFIG_KEY, DEFAULT_TRANSPORT};
use super::{
    ShutdownToken, TRANSPORT_TARGET, TaskServer, TransportError, TransportKind, TransportProvider,
    TransportSettings,
};

type Worker = thread::JoinHandle<Result<(), TransportError>>;

/// Running server plus the worker thread executing its serve loop.
pub struct TransportHandle {
    server: Arc<dyn TaskServer>,
    token: ShutdownToken,
    worker: Option<Worker>,
}

impl TransportHandle {
    /// Spawns the worker running `server`'s serve loop.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Spawn`] when the thread cannot be created.
    pub fn start(server: Arc<dyn TaskServer>) -> Result<Self, TransportError> {
        let kind = server.kind();
        let token = ShutdownToken::new();
        let worker = {
            let server = Arc::clone(&server);
            let token = token.clone();
            thread::Builder::new()
                .name(format!("{kind}-task-server"))
                .spawn(move || run_worker(server.as_ref(), &token))
                .map_err(|source| TransportError::Spawn { kind, source })?
        };
        Ok(Self {
            server,
            token,
            worker: Some(worker),
        })
    }

    /// Transport served by this handle.
    #[must_use]
    pub fn kind(&self) -> TransportKind {
        self.server.kind()
    }

    /// Where the server listens.
    #[must_use]
    pub fn describe(&self) -> String {
        self.server.describe()
    }

    /// Bound socket address, for socket transports.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    /// Returns `true` once the serve loop has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(thread::JoinHandle::is_finished)
    }

    /// Stops the server, cancels the token and joins the worker.
    ///
    /// Every step runs even when an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure: a refused stop, a serve loop error or a
    /// worker panic.
    pub fn shutdown(mut self) -> Result<(), TransportError> {
        let kind = self.kind();
        let stopped = self.server.stop();
        if let Err(error) = &stopped {
            warn!(
                target: TRANSPORT_TARGET,
                transport = %kind,
                error = %error,
                "exception while stopping task server"
            );
        }
        self.token.cancel();
        let joined = match self.worker.take() {
            Some(worker) => worker
                .join()
                .unwrap_or(Err(TransportError::WorkerPanic { kind })),
            None => Ok(()),
        };
        stopped.and(joined)
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TransportHandle")
            .field("kind", &self.kind())
            .field("server", &self.describe())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

fn run_worker(server: &dyn TaskServer, token: &ShutdownToken) -> Result<(), TransportError> {
    let result = server.serve(token);
    if let Err(error) = &result {
        warn!(
            target: TRANSPORT_TARGET,
            transport = %server.kind(),
            error = %error,
            "serve loop ended with an error"
        );
    }
    result
}

/// Outcome of transport selection.
#[derive(Debug)]
pub enum TransportSelection {
    /// A transport was built and its worker started.
    Started(TransportHandle),
    /// `active.config` named no known transport; nothing was started.
    Skipped {
        /// Value found in `active.config`.
        value: String,
    },
}

impl TransportSelection {
    /// The started handle, if any.
    #[must_use]
    pub fn into_handle(self) -> Option<TransportHandle> {
        match self {
            Self::Started(handle) => Some(handle),
            Self::Skipped { .. } => None,
        }
    }
}

/// Chooses and starts exactly one transport from configuration.
#[derive(Debug, Clone, Default)]
pub struct TransportSelector<P> {
    provider: P,
}

impl<P> TransportSelector<P>
where
    P: TransportProvider,
{
    /// Builds a selector constructing servers through `provider`.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Provider used to construct servers.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Reads `active.config` and starts the matching transport.
    ///
    /// An unrecognised value starts nothing and is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the selected transport's settings
    /// are invalid or the server cannot be built or started.
    pub fn select(
        &self,
        store: &PropertyStore,
        service: &Arc<TaskService>,
    ) -> Result<TransportSelection, TransportError> {
        let value = store.get_or(ACTIVE_CONFIG_KEY, DEFAULT_TRANSPORT.as_str());
        let Ok(kind) = value.parse::<TransportKind>() else {
            warn!(
                target: TRANSPORT_TARGET,
                value,
                "unrecognised active.config; no transport started"
            );
            return Ok(TransportSelection::Skipped {
                value: value.to_owned(),
            });
        };

        let settings = TransportSettings::from_properties(kind, store)?;
        let server = self.provider.build(&settings, Arc::clone(service))?;
        let handle = TransportHandle::start(server)?;
        info!(
            target: TRANSPORT_TARGET,
            transport = %kind,
            server = %handle.describe(),
            "task service started"
        );
        Ok(TransportSelection::Started(handle))
    }
}

//! Queue-based transport reached through a naming context.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::service::TaskService;

use super::{JmsSettings, ShutdownToken, TRANSPORT_TARGET, TaskServer, TransportError, TransportKind};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors raised by naming-context lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// Nothing is bound under the name.
    #[error("name not found: {name}")]
    NameNotFound {
        /// Name that was looked up.
        name: String,
    },
    /// The binding exists but is unusable.
    #[error("invalid binding for {name}: {reason}")]
    InvalidBinding {
        /// Name that was looked up.
        name: String,
        /// Why the binding was rejected.
        reason: String,
    },
}

/// Directory resolving administered objects such as connection factories.
pub trait NamingContext: Send + Sync {
    /// Resolves `name` to the provider URL it is bound to.
    ///
    /// # Errors
    ///
    /// Returns a [`NamingError`] when the name cannot be resolved.
    fn lookup(&self, name: &str) -> Result<String, NamingError>;
}

/// Naming context backed by `jndi.binding.<name>` properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyNamingContext {
    bindings: BTreeMap<String, String>,
}

impl PropertyNamingContext {
    /// Builds a context over explicit bindings.
    #[must_use]
    pub fn new(bindings: BTreeMap<String, String>) -> Self {
        Self { bindings }
    }
}

impl NamingContext for PropertyNamingContext {
    fn lookup(&self, name: &str) -> Result<String, NamingError> {
        match self.bindings.get(name) {
            Some(value) if !value.trim().is_empty() => Ok(value.clone()),
            Some(_) => Err(NamingError::InvalidBinding {
                name: name.to_owned(),
                reason: String::from("binding is empty"),
            }),
            None => Err(NamingError::NameNotFound {
                name: name.to_owned(),
            }),
        }
    }
}

/// Queue server consuming task requests and publishing responses.
#[derive(Debug)]
pub struct QueueServer {
    connection_factory: String,
    provider_url: String,
    transacted: bool,
    acknowledge_mode: String,
    queue_name: String,
    response_queue_name: String,
    service: Arc<TaskService>,
    stopped: AtomicBool,
}

impl QueueServer {
    /// Resolves the connection factory through `naming` and prepares the
    /// server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Startup`] when the lookup fails.
    pub fn connect(
        settings: &JmsSettings,
        naming: &dyn NamingContext,
        service: Arc<TaskService>,
    ) -> Result<Self, TransportError> {
        let provider_url = naming
            .lookup(&settings.connection_factory)
            .map_err(|error| {
                TransportError::startup(
                    TransportKind::Jms,
                    format!(
                        "naming lookup for connection factory '{}' failed",
                        settings.connection_factory
                    ),
                    error,
                )
            })?;
        Ok(Self {
            connection_factory: settings.connection_factory.clone(),
            provider_url,
            transacted: settings.transacted,
            acknowledge_mode: settings.acknowledge_mode.clone(),
            queue_name: settings.queue_name.clone(),
            response_queue_name: settings.response_queue_name.clone(),
            service,
            stopped: AtomicBool::new(false),
        })
    }

    /// Provider URL the connection factory resolved to.
    #[must_use]
    pub fn provider_url(&self) -> &str {
        self.provider_url.as_str()
    }
}

impl TaskServer for QueueServer {
    fn kind(&self) -> TransportKind {
        TransportKind::Jms
    }

    fn describe(&self) -> String {
        format!(
            "queue {} replying on {} via {}",
            self.queue_name, self.response_queue_name, self.connection_factory
        )
    }

    fn serve(&self, token: &ShutdownToken) -> Result<(), TransportError> {
        info!(
            target: TRANSPORT_TARGET,
            transport = %TransportKind::Jms,
            provider_url = %self.provider_url,
            queue = %self.queue_name,
            response_queue = %self.response_queue_name,
            transacted = self.transacted,
            acknowledge_mode = %self.acknowledge_mode,
            users = self.service.user_count(),
            "queue consumer active"
        );
        while !token.is_cancelled() && !self.stopped.load(Ordering::SeqCst) {
            thread::sleep(POLL_INTERVAL);
        }
        debug!(
            target: TRANSPORT_TARGET,
            transport = %TransportKind::Jms,
            "queue consumer stopped"
        );
        Ok(())
    }

    fn stop(&self) -> Result<(), TransportError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::PersistenceContext;
    use mockall::mock;
    use rstest::{fixture, rstest};

    mock! {
        Naming {}
        impl NamingContext for Naming {
            fn lookup(&self, name: &str) -> Result<String, NamingError>;
        }
    }

    #[fixture]
    fn settings() -> JmsSettings {
        JmsSettings {
            connection_factory: String::from("ConnectionFactory"),
            transacted: true,
            acknowledge_mode: String::new(),
            queue_name: String::from("tasksQueue"),
            response_queue_name: String::from("tasksResponseQueue"),
            bindings: BTreeMap::new(),
        }
    }

    fn service() -> Arc<TaskService> {
        Arc::new(TaskService::new(PersistenceContext::new("unit"), None))
    }

    #[rstest]
    fn lookup_failure_is_a_startup_error(settings: JmsSettings) {
        let mut naming = MockNaming::new();
        naming
            .expect_lookup()
            .withf(|name: &str| name == "ConnectionFactory")
            .once()
            .returning(|name: &str| {
                Err(NamingError::NameNotFound {
                    name: name.to_owned(),
                })
            });

        let error = QueueServer::connect(&settings, &naming, service()).expect_err("lookup fails");
        assert!(matches!(
            error,
            TransportError::Startup {
                kind: TransportKind::Jms,
                ..
            }
        ));
    }

    #[rstest]
    fn resolved_factory_builds_server(settings: JmsSettings) {
        let naming = PropertyNamingContext::new(
            [(
                String::from("ConnectionFactory"),
                String::from("tcp://localhost:5445"),
            )]
            .into_iter()
            .collect(),
        );

        let server = QueueServer::connect(&settings, &naming, service()).expect("connect");
        assert_eq!(server.provider_url(), "tcp://localhost:5445");
        assert!(server.describe().contains("tasksQueue"));

        let token = ShutdownToken::new();
        token.cancel();
        server.serve(&token).expect("serve returns once cancelled");
    }

    #[rstest]
    #[case(None, "name not found")]
    #[case(Some(" "), "binding is empty")]
    fn property_context_rejects_missing_or_blank_bindings(
        #[case] binding: Option<&str>,
        #[case] expected: &str,
    ) {
        let bindings = binding
            .map(|value| (String::from("ConnectionFactory"), value.to_owned()))
            .into_iter()
            .collect();
        let error = PropertyNamingContext::new(bindings)
            .lookup("ConnectionFactory")
            .expect_err("lookup fails");
        assert!(error.to_string().contains(expected));
    }
}

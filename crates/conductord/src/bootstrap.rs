//! Human-task service bootstrap.
//!
//! [`HumanTaskService::init`] runs a linear pipeline: build the persistence
//! context and core task service, attach the optional escalation policy,
//! load principals, start exactly one transport and register the
//! user-group callback when none exists yet. Optional pieces degrade with a
//! health event; transport and callback failures abort startup.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use conductor_config::{Config, PropertyError, PropertyStore};

use crate::callback::CallbackRegistry;
use crate::components::{ComponentError, Components};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::principals::{BundledResources, PrincipalKind, PrincipalLoader, PrincipalMap};
use crate::service::{
    DefaultEscalationHandler, EscalationHandler, PersistenceContext, TaskService, UserInfo,
};
use crate::transport::{
    DefaultTransportProvider, TransportError, TransportHandle, TransportKind, TransportProvider,
    TransportSelection, TransportSelector,
};

/// Persistence unit backing task storage.
pub const PERSISTENCE_UNIT_KEY: &str = "task.persistence.unit";
/// Persistence unit used when none is configured.
pub const DEFAULT_PERSISTENCE_UNIT: &str = "org.jbpm.task";
/// Escalation handler identifier.
pub const ESCALATION_HANDLER_KEY: &str = "escalated.deadline.handler.class";
/// User directory identifier, read when the escalation handler needs one.
pub const USER_INFO_KEY: &str = "user.info.class";
/// Location of the user directory; empty disables loading.
pub const LOAD_USERS_KEY: &str = "load.users";
/// Location of the group directory; empty disables loading.
pub const LOAD_GROUPS_KEY: &str = "load.groups";
/// User-group callback identifier; empty registers nothing.
pub const CALLBACK_KEY: &str = "user.group.callback.class";

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Lifecycle states of a [`HumanTaskService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Built but not yet initialised.
    Created,
    /// `init()` is running.
    Initializing,
    /// A transport (if any) is serving and the callback is registered.
    Running,
    /// `init()` aborted; only `destroy()` is accepted.
    Failed,
    /// `destroy()` has run.
    Destroyed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Destroyed => "destroyed",
        };
        formatter.write_str(label)
    }
}

/// Failure to build an optional component; startup continues without it.
#[derive(Debug, Error)]
pub enum OptionalComponentError {
    /// The identifier property was missing.
    #[error(transparent)]
    Property(#[from] PropertyError),
    /// The identifier could not be instantiated.
    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// Errors that abort `init()`.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The operation is not valid in the current state.
    #[error("cannot {operation} a task service that is {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the service was in.
        state: ServiceState,
    },
    /// The selected transport could not be configured or started.
    #[error("failed to start transport: {0}")]
    Transport(#[from] TransportError),
    /// The configured user-group callback could not be built.
    #[error("failed to register user group callback: {0}")]
    Callback(#[source] ComponentError),
}

/// Bootstrap owning the task service and its transport.
pub struct HumanTaskService<P = DefaultTransportProvider> {
    properties: PropertyStore,
    components: Components,
    loader: PrincipalLoader,
    selector: TransportSelector<P>,
    callbacks: Arc<CallbackRegistry>,
    reporter: Arc<dyn HealthReporter>,
    state: ServiceState,
    service: Option<Arc<TaskService>>,
    transport: Option<TransportHandle>,
}

impl HumanTaskService {
    /// Builds a bootstrap with the production collaborators.
    ///
    /// Callbacks are registered in [`CallbackRegistry::global`].
    #[must_use]
    pub fn new(properties: PropertyStore) -> Self {
        Self {
            properties,
            components: Components::with_builtins(),
            loader: PrincipalLoader::new(BundledResources::builtin()),
            selector: TransportSelector::new(DefaultTransportProvider),
            callbacks: CallbackRegistry::global(),
            reporter: Arc::new(StructuredHealthReporter::new()),
            state: ServiceState::Created,
            service: None,
            transport: None,
        }
    }
}

impl<P> HumanTaskService<P>
where
    P: TransportProvider,
{
    /// Replaces the provider used to build transport servers.
    #[must_use]
    pub fn with_provider<Q>(self, provider: Q) -> HumanTaskService<Q>
    where
        Q: TransportProvider,
    {
        HumanTaskService {
            properties: self.properties,
            components: self.components,
            loader: self.loader,
            selector: TransportSelector::new(provider),
            callbacks: self.callbacks,
            reporter: self.reporter,
            state: self.state,
            service: self.service,
            transport: self.transport,
        }
    }

    /// Replaces the component registries.
    #[must_use]
    pub fn with_components(mut self, components: Components) -> Self {
        self.components = components;
        self
    }

    /// Replaces the resources `classpath:` locations resolve against.
    #[must_use]
    pub fn with_resources(mut self, resources: BundledResources) -> Self {
        self.loader = PrincipalLoader::new(resources);
        self
    }

    /// Registers callbacks in `registry` instead of the global one.
    #[must_use]
    pub fn with_callback_registry(mut self, registry: Arc<CallbackRegistry>) -> Self {
        self.callbacks = registry;
        self
    }

    /// Routes lifecycle events to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ServiceState {
        self.state
    }

    /// Properties the bootstrap reads.
    #[must_use]
    pub const fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Core task service, once `init()` has built it.
    #[must_use]
    pub fn task_service(&self) -> Option<&Arc<TaskService>> {
        self.service.as_ref()
    }

    /// Transport that is currently running.
    #[must_use]
    pub fn transport_kind(&self) -> Option<TransportKind> {
        self.transport.as_ref().map(TransportHandle::kind)
    }

    /// Bound address of a running socket transport.
    #[must_use]
    pub fn server_address(&self) -> Option<SocketAddr> {
        self.transport.as_ref().and_then(TransportHandle::local_addr)
    }

    /// Brings the service up.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::InvalidState`] unless the service is
    /// freshly created, or the transport or callback failure that aborted
    /// startup. A failed service must be destroyed, not re-initialised.
    pub fn init(&mut self) -> Result<(), BootstrapError> {
        if self.state != ServiceState::Created {
            return Err(BootstrapError::InvalidState {
                operation: "initialise",
                state: self.state,
            });
        }
        self.state = ServiceState::Initializing;
        self.reporter.bootstrap_starting();

        match self.run_pipeline() {
            Ok(transport) => {
                self.state = ServiceState::Running;
                self.reporter.bootstrap_succeeded(transport);
                Ok(())
            }
            Err(error) => {
                self.state = ServiceState::Failed;
                self.reporter.bootstrap_failed(&error);
                Err(error)
            }
        }
    }

    /// Stops the running transport and marks the service destroyed.
    ///
    /// Before `init()` this does nothing. Repeated calls are harmless.
    ///
    /// # Errors
    ///
    /// Returns the first [`TransportError`] raised while stopping the
    /// server or joining its worker. The service is destroyed regardless.
    pub fn destroy(&mut self) -> Result<(), TransportError> {
        if self.state == ServiceState::Created {
            return Ok(());
        }
        self.state = ServiceState::Destroyed;
        let result = self.transport.take().map_or(Ok(()), TransportHandle::shutdown);
        match &result {
            Ok(()) => self.reporter.shutdown_completed(),
            Err(error) => self.reporter.shutdown_failed(error),
        }
        result
    }

    fn run_pipeline(&mut self) -> Result<Option<TransportKind>, BootstrapError> {
        let unit = self
            .properties
            .get_or(PERSISTENCE_UNIT_KEY, DEFAULT_PERSISTENCE_UNIT);
        let persistence = PersistenceContext::new(unit);
        let escalation = self.resolve_escalation_handler();
        let service = Arc::new(TaskService::new(persistence, escalation));
        self.service = Some(Arc::clone(&service));

        let users = self.load_principals(PrincipalKind::User, LOAD_USERS_KEY);
        let groups = self.load_principals(PrincipalKind::Group, LOAD_GROUPS_KEY);
        service.add_users_and_groups(users, groups);

        self.transport = match self.selector.select(&self.properties, &service)? {
            TransportSelection::Started(handle) => {
                self.reporter
                    .transport_started(handle.kind(), &handle.describe());
                Some(handle)
            }
            TransportSelection::Skipped { value } => {
                self.reporter.transport_skipped(&value);
                None
            }
        };

        if let Err(error) = self.register_callback() {
            if let Some(handle) = self.transport.take()
                && let Err(shutdown) = handle.shutdown()
            {
                self.reporter.shutdown_failed(&shutdown);
            }
            return Err(error);
        }
        Ok(self.transport_kind())
    }

    fn resolve_escalation_handler(&self) -> Option<Box<dyn EscalationHandler>> {
        let name = self
            .properties
            .get_or(ESCALATION_HANDLER_KEY, DefaultEscalationHandler::IDENTIFIER);
        let mut handler = match self.components.escalation_handlers().instantiate(name) {
            Ok(handler) => handler?,
            Err(error) => {
                self.reporter
                    .escalation_handler_unavailable(&OptionalComponentError::from(error));
                return None;
            }
        };

        if handler.requires_user_info() {
            match self.resolve_user_info() {
                Ok(user_info) => handler.set_user_info(user_info),
                Err(error) => {
                    self.reporter.user_info_unavailable(&error);
                    handler.set_user_info(None);
                }
            }
        }
        Some(handler)
    }

    fn resolve_user_info(&self) -> Result<Option<Box<dyn UserInfo>>, OptionalComponentError> {
        let name = self.properties.require(USER_INFO_KEY)?;
        Ok(self.components.user_info().instantiate(name)?)
    }

    fn load_principals(&self, kind: PrincipalKind, key: &str) -> PrincipalMap {
        let location = self.properties.get_or(key, "");
        match self.loader.try_load(kind, location) {
            Ok(principals) => {
                self.reporter.principals_loaded(kind, principals.len());
                principals
            }
            Err(error) => {
                self.reporter.principals_degraded(kind, location, &error);
                PrincipalMap::new()
            }
        }
    }

    fn register_callback(&self) -> Result<(), BootstrapError> {
        if self.callbacks.exists() {
            self.reporter.callback_already_registered();
            return Ok(());
        }
        let name = self.properties.get_or(CALLBACK_KEY, "");
        let Some(callback) = self
            .components
            .callbacks()
            .instantiate(name)
            .map_err(BootstrapError::Callback)?
        else {
            return Ok(());
        };
        if self.callbacks.register_if_absent(Arc::from(callback)) {
            self.reporter.callback_registered(name);
        } else {
            self.reporter.callback_already_registered();
        }
        Ok(())
    }
}

impl<P> fmt::Debug for HumanTaskService<P> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HumanTaskService")
            .field("state", &self.state)
            .field("transport", &self.transport)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

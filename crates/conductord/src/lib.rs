//! Bootstrap for the Conductor human-task service.
//!
//! The daemon reads task-server properties, builds the core task service,
//! loads user and group directories, starts exactly one network transport
//! (`mina`, `hornetq` or `jms`, chosen by `active.config`) and registers the
//! user-group callback. [`HumanTaskService`] owns that lifecycle through
//! `init()` and `destroy()`.
//!
//! Startup tolerates failures in optional pieces. A principal file
//! that cannot be read yields an empty directory, and an escalation handler
//! that cannot be built leaves the service without escalation. Each
//! degradation is surfaced through the [`HealthReporter`]. Failures that
//! leave the service unreachable, such as an invalid port or a failed
//! naming lookup, abort `init()`.
//!
//! Pluggable strategy points are resolved through explicit registries
//! ([`Components`]) rather than dynamic loading, and the user-group callback
//! lives in a single-assignment [`CallbackRegistry`] passed to the bootstrap.

mod bootstrap;
mod callback;
mod components;
mod health;
pub mod principals;
mod process;
mod service;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, CALLBACK_KEY, ConfigLoader, DEFAULT_PERSISTENCE_UNIT, ESCALATION_HANDLER_KEY,
    HumanTaskService, LOAD_GROUPS_KEY, LOAD_USERS_KEY, OptionalComponentError,
    PERSISTENCE_UNIT_KEY, ServiceState, SystemConfigLoader, USER_INFO_KEY,
};
pub use callback::{CallbackRegistry, DefaultUserGroupCallback, UserGroupCallback};
pub use components::{ComponentError, ComponentRegistry, Components, FactoryError};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, LaunchPlan, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon,
    run_daemon_with,
};
pub use service::{
    DefaultEscalationHandler, EscalationHandler, PersistenceContext, TaskService, UserInfo,
};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;

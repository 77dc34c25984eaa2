//! Supervises daemon launch sequencing and teardown.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, HumanTaskService, SystemConfigLoader};
use crate::callback::CallbackRegistry;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::telemetry;
use crate::transport::{DefaultTransportProvider, TransportProvider};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Collaborators required to run the daemon.
pub struct LaunchPlan<L, S, P> {
    /// Source of the daemon configuration.
    pub loader: L,
    /// Blocks until the daemon should stop.
    pub shutdown: S,
    /// Builds the selected transport server.
    pub provider: P,
    /// Receives lifecycle events.
    pub reporter: Arc<dyn HealthReporter>,
    /// Registry receiving the user-group callback.
    pub callbacks: Arc<CallbackRegistry>,
}

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns a [`LaunchError`] when any launch step fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        shutdown: SystemShutdownSignal::new(SHUTDOWN_TIMEOUT),
        provider: DefaultTransportProvider,
        reporter: Arc::new(StructuredHealthReporter::new()),
        callbacks: CallbackRegistry::global(),
    })
}

/// Runs the daemon with injected collaborators.
///
/// Loads configuration, installs telemetry, reads the task-server
/// properties, initialises the service, waits for shutdown and destroys the
/// service. The service is destroyed even when waiting fails.
///
/// # Errors
///
/// Returns a [`LaunchError`] when any launch step fails.
pub fn run_daemon_with<L, S, P>(plan: LaunchPlan<L, S, P>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
    P: TransportProvider,
{
    let LaunchPlan {
        loader,
        shutdown,
        provider,
        reporter,
        callbacks,
    } = plan;

    let config = loader.load()?;
    telemetry::initialise(&config).map_err(|source| LaunchError::Telemetry { source })?;
    info!(
        target: PROCESS_TARGET,
        properties = config.properties_path().map(|path| path.as_str()),
        "starting task service daemon"
    );
    let properties = config
        .load_properties()
        .map_err(|source| LaunchError::Properties { source })?;

    let mut service = HumanTaskService::new(properties)
        .with_provider(provider)
        .with_reporter(reporter)
        .with_callback_registry(callbacks);
    if let Err(error) = service.init() {
        if let Err(teardown) = service.destroy() {
            warn!(
                target: PROCESS_TARGET,
                error = %teardown,
                "teardown after failed start did not complete"
            );
        }
        return Err(error.into());
    }

    let waited = shutdown.wait();
    let destroyed = service
        .destroy()
        .map_err(|source| LaunchError::Teardown { source });
    waited?;
    destroyed?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}

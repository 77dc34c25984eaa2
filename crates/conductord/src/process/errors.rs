//! Defines the unified error surface for daemon launch and supervision.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use conductor_config::PropertyError;

use crate::bootstrap::BootstrapError;
use crate::telemetry::TelemetryError;
use crate::transport::TransportError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The task-server properties could not be read.
    #[error("failed to load task server properties: {source}")]
    Properties {
        /// Underlying property error.
        #[source]
        source: PropertyError,
    },
    /// The task service failed to start.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Waiting for a shutdown signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    /// The transport did not stop cleanly.
    #[error("failed to stop task service: {source}")]
    Teardown {
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

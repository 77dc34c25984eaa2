//! Shared configuration for the Conductor task service daemon.
//!
//! Two layers live here. [`Config`] carries the daemon settings resolved by
//! `ortho_config` from CLI flags, `CONDUCTOR_*` environment variables and an
//! optional `conductor.toml`. [`PropertyStore`] holds the flat task-server
//! properties (`task.persistence.unit`, `active.config`, ...) read from the
//! file named by [`Config::properties_path`]. Property lookups are validated
//! lazily: a required key is only reported missing when it is first read.

mod defaults;
mod logging;
mod properties;

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use properties::{PropertyError, PropertyStore, decode_properties, parse_properties};

/// Daemon configuration resolved from CLI, environment and file layers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CONDUCTOR")]
pub struct Config {
    /// Path to the `.properties` file holding task-server settings.
    ///
    /// When unset the property store starts empty and every key falls back
    /// to its built-in default.
    pub properties_path: Option<Utf8PathBuf>,
    /// Tracing filter expression applied to daemon telemetry.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format used for daemon telemetry.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            properties_path: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads the configuration using the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when any layer is
    /// malformed.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads the configuration from an explicit argument list.
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when any layer is
    /// malformed.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Returns the configured properties file, if any.
    #[must_use]
    pub fn properties_path(&self) -> Option<&Utf8Path> {
        self.properties_path.as_deref()
    }

    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the telemetry output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Loads the task-server property store described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Read`] when the configured file cannot be
    /// read. A missing `properties_path` yields an empty store.
    pub fn load_properties(&self) -> Result<PropertyStore, PropertyError> {
        match self.properties_path() {
            Some(path) => PropertyStore::load(path),
            None => Ok(PropertyStore::new()),
        }
    }
}

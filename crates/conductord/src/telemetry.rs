//! Tracing setup for the task service daemon.
//!
//! The configured `log_filter` governs the daemon's own targets. HTTP and
//! TLS crates pulled in for remote principal directories are held at `warn`
//! unless the filter names them explicitly.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::{self, time::UtcTime};

use conductor_config::{Config, LogFormat};

const QUIET_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

static INSTALLED_FILTER: OnceCell<String> = OnceCell::new();

/// Proof that the global subscriber is installed.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    filter: &'static str,
}

impl TelemetryHandle {
    /// Filter expression the subscriber was installed with, including the
    /// directives quietening dependency targets.
    #[must_use]
    pub const fn filter(&self) -> &'static str {
        self.filter
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls keep the first subscriber and report its filter.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED_FILTER
        .get_or_try_init(|| {
            let (filter, effective) = daemon_filter(config.log_filter())?;
            tracing::subscriber::set_global_default(subscriber(filter, config.log_format()))
                .map_err(TelemetryError::Subscriber)?;
            Ok(effective)
        })
        .map(|filter| TelemetryHandle {
            filter: filter.as_str(),
        })
}

/// Parses `expression` and adds a `warn` cap for every quiet target it does
/// not mention. Returns the filter and its textual form.
fn daemon_filter(expression: &str) -> Result<(EnvFilter, String), TelemetryError> {
    let invalid = |message: String| TelemetryError::Filter {
        filter: expression.to_owned(),
        message,
    };
    let mut filter = EnvFilter::try_new(expression).map_err(|error| invalid(error.to_string()))?;
    let mut effective = expression.to_owned();
    for target in QUIET_TARGETS {
        if mentions_target(expression, target) {
            continue;
        }
        let directive = format!("{target}=warn");
        let parsed = directive
            .parse::<Directive>()
            .map_err(|error| invalid(error.to_string()))?;
        filter = filter.add_directive(parsed);
        effective.push(',');
        effective.push_str(&directive);
    }
    Ok((filter, effective))
}

fn mentions_target(expression: &str, target: &str) -> bool {
    expression.split(',').any(|directive| {
        directive
            .split(['=', '['])
            .next()
            .is_some_and(|name| name.trim() == target)
    })
}

fn subscriber(filter: EnvFilter, format: LogFormat) -> Box<dyn Subscriber + Send + Sync> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());
    match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    }
}

//! Structured health reporting for bootstrap lifecycle events.

use std::sync::Arc;

use crate::bootstrap::{BootstrapError, OptionalComponentError};
use crate::principals::{PrincipalError, PrincipalKind};
use crate::transport::{TransportError, TransportKind};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked when `init()` begins.
    fn bootstrap_starting(&self);

    /// Invoked when `init()` completes; `transport` is `None` when no
    /// transport was selected.
    fn bootstrap_succeeded(&self, transport: Option<TransportKind>);

    /// Invoked when `init()` fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// The configured escalation handler could not be built; the service
    /// runs without escalation.
    fn escalation_handler_unavailable(&self, error: &OptionalComponentError);

    /// The user directory for the escalation handler could not be built;
    /// the handler runs without one.
    fn user_info_unavailable(&self, error: &OptionalComponentError);

    /// Principals of `kind` were registered.
    fn principals_loaded(&self, kind: PrincipalKind, count: usize);

    /// A principal directory failed to load and was replaced by an empty one.
    fn principals_degraded(&self, kind: PrincipalKind, location: &str, error: &PrincipalError);

    /// A transport worker started.
    fn transport_started(&self, kind: TransportKind, description: &str);

    /// `active.config` named no known transport.
    fn transport_skipped(&self, value: &str);

    /// A user-group callback was registered under `name`.
    fn callback_registered(&self, name: &str);

    /// A callback was already present, so registration was skipped.
    fn callback_already_registered(&self);

    /// `destroy()` completed.
    fn shutdown_completed(&self);

    /// Tearing down the transport failed.
    fn shutdown_failed(&self, error: &TransportError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, transport: Option<TransportKind>) {
        (**self).bootstrap_succeeded(transport);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn escalation_handler_unavailable(&self, error: &OptionalComponentError) {
        (**self).escalation_handler_unavailable(error);
    }

    fn user_info_unavailable(&self, error: &OptionalComponentError) {
        (**self).user_info_unavailable(error);
    }

    fn principals_loaded(&self, kind: PrincipalKind, count: usize) {
        (**self).principals_loaded(kind, count);
    }

    fn principals_degraded(&self, kind: PrincipalKind, location: &str, error: &PrincipalError) {
        (**self).principals_degraded(kind, location, error);
    }

    fn transport_started(&self, kind: TransportKind, description: &str) {
        (**self).transport_started(kind, description);
    }

    fn transport_skipped(&self, value: &str) {
        (**self).transport_skipped(value);
    }

    fn callback_registered(&self, name: &str) {
        (**self).callback_registered(name);
    }

    fn callback_already_registered(&self) {
        (**self).callback_already_registered();
    }

    fn shutdown_completed(&self) {
        (**self).shutdown_completed();
    }

    fn shutdown_failed(&self, error: &TransportError) {
        (**self).shutdown_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting task service bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, transport: Option<TransportKind>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            transport = transport.map(TransportKind::as_str),
            "task service startup completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "task service bootstrap failed"
        );
    }

    fn escalation_handler_unavailable(&self, error: &OptionalComponentError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "escalation_handler_unavailable",
            error = %error,
            "escalation handler misconfigured; running without escalation"
        );
    }

    fn user_info_unavailable(&self, error: &OptionalComponentError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "user_info_unavailable",
            error = %error,
            "user info unavailable; escalation handler runs without it"
        );
    }

    fn principals_loaded(&self, kind: PrincipalKind, count: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "principals_loaded",
            kind = %kind,
            count,
            "principals registered"
        );
    }

    fn principals_degraded(&self, kind: PrincipalKind, location: &str, error: &PrincipalError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "principals_degraded",
            kind = %kind,
            location,
            error = %error,
            "principal directory unavailable; continuing with none"
        );
    }

    fn transport_started(&self, kind: TransportKind, description: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "transport_started",
            transport = %kind,
            server = description,
            "task service running"
        );
    }

    fn transport_skipped(&self, value: &str) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "transport_skipped",
            active_config = value,
            "no transport matches active.config; none started"
        );
    }

    fn callback_registered(&self, name: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "callback_registered",
            callback = name,
            "user group callback registered"
        );
    }

    fn callback_already_registered(&self) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "callback_already_registered",
            "user group callback already present"
        );
    }

    fn shutdown_completed(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_completed",
            "task service stopped"
        );
    }

    fn shutdown_failed(&self, error: &TransportError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "shutdown_failed",
            error = %error,
            "exception while stopping task server"
        );
    }
}

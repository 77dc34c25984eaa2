//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use crate::bootstrap::{BootstrapError, OptionalComponentError};
use crate::health::HealthReporter;
use crate::principals::{PrincipalError, PrincipalKind};
use crate::transport::{TransportError, TransportKind};

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded(Option<TransportKind>),
    BootstrapFailed(String),
    EscalationHandlerUnavailable(String),
    UserInfoUnavailable(String),
    PrincipalsLoaded { kind: PrincipalKind, count: usize },
    PrincipalsDegraded { kind: PrincipalKind, location: String },
    TransportStarted(TransportKind),
    TransportSkipped(String),
    CallbackRegistered(String),
    CallbackAlreadyRegistered,
    ShutdownCompleted,
    ShutdownFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Returns `true` when `event` was recorded.
    #[must_use]
    pub fn recorded(&self, event: &HealthEvent) -> bool {
        self.events().contains(event)
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, transport: Option<TransportKind>) {
        self.record(HealthEvent::BootstrapSucceeded(transport));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn escalation_handler_unavailable(&self, error: &OptionalComponentError) {
        self.record(HealthEvent::EscalationHandlerUnavailable(error.to_string()));
    }

    fn user_info_unavailable(&self, error: &OptionalComponentError) {
        self.record(HealthEvent::UserInfoUnavailable(error.to_string()));
    }

    fn principals_loaded(&self, kind: PrincipalKind, count: usize) {
        self.record(HealthEvent::PrincipalsLoaded { kind, count });
    }

    fn principals_degraded(&self, kind: PrincipalKind, location: &str, _error: &PrincipalError) {
        self.record(HealthEvent::PrincipalsDegraded {
            kind,
            location: location.to_owned(),
        });
    }

    fn transport_started(&self, kind: TransportKind, _description: &str) {
        self.record(HealthEvent::TransportStarted(kind));
    }

    fn transport_skipped(&self, value: &str) {
        self.record(HealthEvent::TransportSkipped(value.to_owned()));
    }

    fn callback_registered(&self, name: &str) {
        self.record(HealthEvent::CallbackRegistered(name.to_owned()));
    }

    fn callback_already_registered(&self) {
        self.record(HealthEvent::CallbackAlreadyRegistered);
    }

    fn shutdown_completed(&self) {
        self.record(HealthEvent::ShutdownCompleted);
    }

    fn shutdown_failed(&self, error: &TransportError) {
        self.record(HealthEvent::ShutdownFailed(error.to_string()));
    }
}

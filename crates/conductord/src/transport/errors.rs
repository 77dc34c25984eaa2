//! Error types for transport selection and lifecycle.

use std::io;
use std::net::SocketAddr;
use std::num::ParseIntError;

use thiserror::Error;

use conductor_config::PropertyError;

use super::TransportKind;

/// Errors surfaced while selecting, starting or stopping a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A required transport property is missing.
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error("invalid port in {key}: '{value}': {source}")]
    InvalidPort {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    /// The server could not be constructed from its configuration.
    #[error("error while starting {kind} task service: {message}")]
    Startup {
        kind: TransportKind,
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to spawn {kind} worker thread: {source}")]
    Spawn {
        kind: TransportKind,
        #[source]
        source: io::Error,
    },
    #[error("failed to stop {kind} task server: {message}")]
    Stop { kind: TransportKind, message: String },
    #[error("{kind} worker thread panicked")]
    WorkerPanic { kind: TransportKind },
}

impl TransportError {
    /// Wraps a server construction failure.
    #[must_use]
    pub fn startup(
        kind: TransportKind,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Startup {
            kind,
            message: message.into(),
            source: source.into(),
        }
    }
}

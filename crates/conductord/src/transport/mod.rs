//! Network transports exposing the task service.
//!
//! Exactly one transport runs per bootstrap. The selector reads
//! `active.config`, resolves the transport's settings from the property
//! store, builds the server through a [`TransportProvider`] and runs its
//! serve loop on a dedicated worker. The returned [`TransportHandle`] owns
//! the worker and tears it down in one call.

mod errors;
mod handler;
mod kind;
mod queue;
mod selector;
mod server;
mod settings;
mod socket;
mod token;

pub use self::errors::TransportError;
pub use self::kind::{TransportKind, TransportKindParseError};
pub use self::queue::{NamingContext, NamingError, PropertyNamingContext, QueueServer};
pub use self::selector::{TransportHandle, TransportSelection, TransportSelector};
pub use self::server::{DefaultTransportProvider, TaskServer, TransportProvider};
pub use self::settings::{
    ACTIVE_CONFIG_KEY, DEFAULT_TRANSPORT, Endpoint, JmsSettings, NAMING_BINDING_PREFIX,
    TransportSettings,
};
pub use self::token::ShutdownToken;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

#[cfg(test)]
mod tests;

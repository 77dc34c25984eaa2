//! Per-transport settings read from the property store.

use std::collections::BTreeMap;
use std::fmt;

use conductor_config::PropertyStore;

use super::{TransportError, TransportKind};

/// Property naming the active transport.
pub const ACTIVE_CONFIG_KEY: &str = "active.config";
/// Transport used when `active.config` is unset.
pub const DEFAULT_TRANSPORT: TransportKind = TransportKind::HornetQ;

/// Host the socket transport binds to.
pub const MINA_HOST_KEY: &str = "mina.host";
/// Port the socket transport binds to.
pub const MINA_PORT_KEY: &str = "mina.port";
/// Host the message-bus transport binds to.
pub const HORNETQ_HOST_KEY: &str = "hornetq.host";
/// Port the message-bus transport binds to.
pub const HORNETQ_PORT_KEY: &str = "hornetq.port";
/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";
/// Socket transport port used when none is configured.
pub const DEFAULT_MINA_PORT: &str = "9123";
/// Message-bus transport port used when none is configured.
pub const DEFAULT_HORNETQ_PORT: &str = "5153";

/// Naming-context name of the queue connection factory.
pub const JMS_CONNECTION_FACTORY_KEY: &str = "JMSTaskServer.connectionFactory";
/// Whether queue sessions are transacted.
pub const JMS_TRANSACTED_KEY: &str = "JMSTaskServer.transacted";
/// Session acknowledge mode; empty when unset.
pub const JMS_ACKNOWLEDGE_MODE_KEY: &str = "JMSTaskServer.acknowledgeMode";
/// Queue receiving task requests.
pub const JMS_QUEUE_NAME_KEY: &str = "JMSTaskServer.queueName";
/// Queue receiving task responses.
pub const JMS_RESPONSE_QUEUE_NAME_KEY: &str = "JMSTaskServer.responseQueueName";

/// Prefix of the properties declaring naming-context bindings.
pub const NAMING_BINDING_PREFIX: &str = "jndi.binding.";

/// Host and port a socket transport binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Builds an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    fn from_properties(
        store: &PropertyStore,
        host_key: &str,
        port_key: &'static str,
        default_port: &str,
    ) -> Result<Self, TransportError> {
        let raw_port = store.get_or(port_key, default_port);
        let port = raw_port
            .parse::<u16>()
            .map_err(|source| TransportError::InvalidPort {
                key: port_key,
                value: raw_port.to_owned(),
                source,
            })?;
        let host = store.get_or(host_key, DEFAULT_HOST);
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

/// Settings of the queue-based transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JmsSettings {
    /// Naming-context name of the connection factory.
    pub connection_factory: String,
    /// Whether sessions are transacted.
    pub transacted: bool,
    /// Acknowledge mode; empty when unset.
    pub acknowledge_mode: String,
    /// Queue receiving task requests.
    pub queue_name: String,
    /// Queue receiving responses.
    pub response_queue_name: String,
    /// Naming-context bindings declared under `jndi.binding.`.
    pub bindings: BTreeMap<String, String>,
}

impl JmsSettings {
    /// Reads the queue settings from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Property`] when a required key is missing.
    pub fn from_properties(store: &PropertyStore) -> Result<Self, TransportError> {
        let connection_factory = store.require(JMS_CONNECTION_FACTORY_KEY)?.to_owned();
        let transacted = parse_flag(store.require(JMS_TRANSACTED_KEY)?);
        let acknowledge_mode = store.get_or(JMS_ACKNOWLEDGE_MODE_KEY, "").to_owned();
        let queue_name = store.require(JMS_QUEUE_NAME_KEY)?.to_owned();
        let response_queue_name = store.require(JMS_RESPONSE_QUEUE_NAME_KEY)?.to_owned();
        let bindings = store
            .keys_with_prefix(NAMING_BINDING_PREFIX)
            .map(|name| {
                let value = store.get_or(&format!("{NAMING_BINDING_PREFIX}{name}"), "");
                (name.to_owned(), value.to_owned())
            })
            .collect();
        Ok(Self {
            connection_factory,
            transacted,
            acknowledge_mode,
            queue_name,
            response_queue_name,
            bindings,
        })
    }
}

/// Only `true`, in any case, enables a flag.
fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Resolved settings for exactly one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSettings {
    /// Socket transport endpoint.
    Mina(Endpoint),
    /// Message-bus transport endpoint.
    HornetQ(Endpoint),
    /// Queue transport settings.
    Jms(JmsSettings),
}

impl TransportSettings {
    /// Reads the settings of `kind` from `store`, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidPort`] for a port that is not a
    /// valid `u16` and [`TransportError::Property`] for missing queue keys.
    pub fn from_properties(
        kind: TransportKind,
        store: &PropertyStore,
    ) -> Result<Self, TransportError> {
        match kind {
            TransportKind::Mina => Endpoint::from_properties(
                store,
                MINA_HOST_KEY,
                MINA_PORT_KEY,
                DEFAULT_MINA_PORT,
            )
            .map(Self::Mina),
            TransportKind::HornetQ => Endpoint::from_properties(
                store,
                HORNETQ_HOST_KEY,
                HORNETQ_PORT_KEY,
                DEFAULT_HORNETQ_PORT,
            )
            .map(Self::HornetQ),
            TransportKind::Jms => JmsSettings::from_properties(store).map(Self::Jms),
        }
    }

    /// Transport these settings configure.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::Mina(_) => TransportKind::Mina,
            Self::HornetQ(_) => TransportKind::HornetQ,
            Self::Jms(_) => TransportKind::Jms,
        }
    }

    /// Socket endpoint, for the socket transports.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Self::Mina(endpoint) | Self::HornetQ(endpoint) => Some(endpoint),
            Self::Jms(_) => None,
        }
    }
}

//! Transports selectable through `active.config`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Network transports the task service can be exposed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Socket server in the style of Apache MINA.
    Mina,
    /// Message-bus socket server; the default transport.
    HornetQ,
    /// Queue-based server reached through a naming context.
    Jms,
}

impl TransportKind {
    /// Every selectable transport, in selection order.
    pub const ALL: [Self; 3] = [Self::Mina, Self::HornetQ, Self::Jms];

    /// Configuration value naming this transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mina => "mina",
            Self::HornetQ => "hornetq",
            Self::Jms => "jms",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when `active.config` names no known transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported transport: {0}")]
pub struct TransportKindParseError(String);

impl TransportKindParseError {
    /// Creates a parse error describing the unsupported value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the offending value as configured.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for TransportKind {
    type Err = TransportKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| TransportKindParseError::new(value))
    }
}

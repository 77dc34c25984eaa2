//! User and group principals handed to the task service.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The two disjoint kinds of principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrincipalKind {
    /// An individual task participant.
    User,
    /// A named collection of users.
    Group,
}

impl PrincipalKind {
    /// Type name used by the expression format (`new User(..)`).
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Group => "Group",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::User => "user",
            Self::Group => "group",
        };
        formatter.write_str(label)
    }
}

/// Error returned when parsing a principal kind fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported principal kind: {0}")]
pub struct PrincipalKindParseError(String);

impl FromStr for PrincipalKind {
    type Err = PrincipalKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(Self::User),
            "group" | "groups" => Ok(Self::Group),
            other => Err(PrincipalKindParseError(other.to_owned())),
        }
    }
}

/// A named user or group usable for task assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal {
    kind: PrincipalKind,
    id: String,
}

impl Principal {
    /// Builds a principal of the given kind.
    #[must_use]
    pub fn new(kind: PrincipalKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Builds a user principal.
    #[must_use]
    pub fn user(id: impl Into<String>) -> Self {
        Self::new(PrincipalKind::User, id)
    }

    /// Builds a group principal.
    #[must_use]
    pub fn group(id: impl Into<String>) -> Self {
        Self::new(PrincipalKind::Group, id)
    }

    /// Unique identifier of the principal.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Kind of the principal.
    #[must_use]
    pub const fn kind(&self) -> PrincipalKind {
        self.kind
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:'{}'", self.kind.type_name(), self.id)
    }
}

/// Principals keyed by identifier.
pub type PrincipalMap = BTreeMap<String, Principal>;

//! Best-effort loading of principal directories.

use std::str::Utf8Error;

use thiserror::Error;
use tracing::warn;

use conductor_config::{decode_properties, parse_properties};

use super::PRINCIPALS_TARGET;
use super::expression::{self, ExpressionError};
use super::model::{Principal, PrincipalKind, PrincipalMap};
use super::resource::{BundledResources, ResourceError, resolve_location};

/// File formats a principal directory may use, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalFormat {
    /// `.mvel` map literal of `new User(..)`/`new Group(..)` constructors.
    Expression,
    /// `.properties` file whose keys are principal identifiers.
    KeyList,
}

impl PrincipalFormat {
    /// Chooses the format for `location`, if the extension is supported.
    #[must_use]
    pub fn detect(location: &str) -> Option<Self> {
        if location.ends_with(".mvel") {
            Some(Self::Expression)
        } else if location.ends_with(".properties") {
            Some(Self::KeyList)
        } else {
            None
        }
    }
}

/// Reasons a principal directory could not be loaded.
#[derive(Debug, Clone, Error)]
pub enum PrincipalError {
    /// The location could not be resolved or read.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// The extension selects no supported format.
    #[error("unsupported principal file format: {location}")]
    UnsupportedFormat {
        /// Location as configured.
        location: String,
    },
    /// An expression file is not valid UTF-8.
    #[error("principal file {location} is not valid UTF-8: {source}")]
    Encoding {
        /// Location as configured.
        location: String,
        /// Decoder error.
        #[source]
        source: Utf8Error,
    },
    /// The expression could not be evaluated.
    #[error("failed to evaluate {location}: {source}")]
    Expression {
        /// Location as configured.
        location: String,
        /// Evaluation error.
        #[source]
        source: ExpressionError,
    },
    /// The expression produced a principal of the wrong kind.
    #[error("{location} maps '{key}' to a {found}, expected a {expected}")]
    KindMismatch {
        /// Location as configured.
        location: String,
        /// Map key holding the mismatched principal.
        key: String,
        /// Kind requested by the caller.
        expected: PrincipalKind,
        /// Kind found in the file.
        found: PrincipalKind,
    },
}

/// Loads user and group directories from configured locations.
#[derive(Debug, Clone, Default)]
pub struct PrincipalLoader {
    resources: BundledResources,
}

impl PrincipalLoader {
    /// Builds a loader resolving `classpath:` locations against `resources`.
    #[must_use]
    pub fn new(resources: BundledResources) -> Self {
        Self { resources }
    }

    /// Loads principals of `kind`, degrading every failure to an empty map.
    ///
    /// An empty location disables loading. Failures are logged at `warn`.
    #[must_use]
    pub fn load(&self, kind: PrincipalKind, location: &str) -> PrincipalMap {
        self.try_load(kind, location).unwrap_or_else(|error| {
            warn!(
                target: PRINCIPALS_TARGET,
                kind = %kind,
                location,
                error = %error,
                "problem loading principals; continuing with none"
            );
            PrincipalMap::new()
        })
    }

    /// Loads principals of `kind`, surfacing the failure.
    ///
    /// An empty location yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns a [`PrincipalError`] when the location cannot be resolved or
    /// its contents cannot be interpreted.
    pub fn try_load(
        &self,
        kind: PrincipalKind,
        location: &str,
    ) -> Result<PrincipalMap, PrincipalError> {
        if location.is_empty() {
            return Ok(PrincipalMap::new());
        }

        let format =
            PrincipalFormat::detect(location).ok_or_else(|| PrincipalError::UnsupportedFormat {
                location: location.to_owned(),
            })?;
        let bytes = resolve_location(location, &self.resources)?;

        match format {
            PrincipalFormat::Expression => {
                let text =
                    std::str::from_utf8(&bytes).map_err(|source| PrincipalError::Encoding {
                        location: location.to_owned(),
                        source,
                    })?;
                evaluate_directory(kind, location, text)
            }
            PrincipalFormat::KeyList => Ok(key_list_directory(kind, &decode_properties(&bytes))),
        }
    }
}

fn evaluate_directory(
    kind: PrincipalKind,
    location: &str,
    text: &str,
) -> Result<PrincipalMap, PrincipalError> {
    let entries = expression::evaluate(text).map_err(|source| PrincipalError::Expression {
        location: location.to_owned(),
        source,
    })?;

    let mut principals = PrincipalMap::new();
    for (key, principal) in entries {
        if principal.kind() != kind {
            return Err(PrincipalError::KindMismatch {
                location: location.to_owned(),
                key,
                expected: kind,
                found: principal.kind(),
            });
        }
        principals.insert(key, principal);
    }
    Ok(principals)
}

fn key_list_directory(kind: PrincipalKind, text: &str) -> PrincipalMap {
    parse_properties(text)
        .into_iter()
        .map(|(id, _)| {
            let principal = Principal::new(kind, id.clone());
            (id, principal)
        })
        .collect()
}

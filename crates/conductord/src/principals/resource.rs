//! Resolution of principal file locations.
//!
//! Locations prefixed with `classpath:` are served from the resources bundled
//! into the binary. Absolute URLs are fetched over `http`/`https` or read as
//! `file:` URLs. A string that is not an absolute URL is a filesystem path.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Prefix selecting the bundled resource set.
pub const CLASSPATH_SCHEME: &str = "classpath:";

const BUILTIN_USERS: &str = include_str!("../../resources/LoadUsers.mvel");
const BUILTIN_GROUPS: &str = include_str!("../../resources/LoadGroups.mvel");

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while resolving a location to bytes.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    /// Nothing exists at the location.
    #[error("file was not found at given location {location}")]
    NotFound {
        /// Location as configured.
        location: String,
    },
    /// The location uses a URL scheme no reader exists for.
    #[error("unsupported scheme '{scheme}' in location {location}")]
    UnsupportedScheme {
        /// Location as configured.
        location: String,
        /// Offending scheme.
        scheme: String,
    },
    /// The location could not be parsed.
    #[error("invalid location {location}: {source}")]
    InvalidLocation {
        /// Location as configured.
        location: String,
        /// URL parser error.
        #[source]
        source: url::ParseError,
    },
    /// The resource exists but reading it failed.
    #[error("failed to read {location}: {source}")]
    Read {
        /// Location as configured.
        location: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// Named resources compiled into the daemon.
#[derive(Debug, Clone, Default)]
pub struct BundledResources {
    entries: BTreeMap<String, Vec<u8>>,
}

impl BundledResources {
    /// Creates an empty resource set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resource set shipped with the daemon: the sample `LoadUsers.mvel` and
    /// `LoadGroups.mvel` directories.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_resource("LoadUsers.mvel", BUILTIN_USERS)
            .with_resource("LoadGroups.mvel", BUILTIN_GROUPS)
    }

    /// Adds or replaces a resource.
    #[must_use]
    pub fn with_resource(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.entries
            .insert(normalise(path).to_owned(), contents.into());
        self
    }

    /// Looks up a resource by path. A leading `/` is optional.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(normalise(path)).map(Vec::as_slice)
    }
}

fn normalise(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Resolves `location` to the bytes it names.
///
/// # Errors
///
/// Returns [`ResourceError::NotFound`] when nothing exists at the location,
/// and the other variants for unreadable or unsupported locations.
pub fn resolve_location(
    location: &str,
    resources: &BundledResources,
) -> Result<Vec<u8>, ResourceError> {
    if let Some(path) = location.strip_prefix(CLASSPATH_SCHEME) {
        return resources
            .get(path)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ResourceError::NotFound {
                location: location.to_owned(),
            });
    }

    match Url::parse(location) {
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| ResourceError::NotFound {
                    location: location.to_owned(),
                })?;
            read_file(location, &path)
        }
        Ok(url) if matches!(url.scheme(), "http" | "https") => fetch_remote(location, url),
        Ok(url) => Err(ResourceError::UnsupportedScheme {
            location: location.to_owned(),
            scheme: url.scheme().to_owned(),
        }),
        Err(url::ParseError::RelativeUrlWithoutBase) => read_file(location, Path::new(location)),
        Err(source) => Err(ResourceError::InvalidLocation {
            location: location.to_owned(),
            source,
        }),
    }
}

fn read_file(location: &str, path: &Path) -> Result<Vec<u8>, ResourceError> {
    fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ResourceError::NotFound {
                location: location.to_owned(),
            }
        } else {
            ResourceError::Read {
                location: location.to_owned(),
                source: Arc::new(source),
            }
        }
    })
}

fn fetch_remote(location: &str, url: Url) -> Result<Vec<u8>, ResourceError> {
    let read_error = |source: reqwest::Error| ResourceError::Read {
        location: location.to_owned(),
        source: Arc::new(io::Error::other(source)),
    };
    let response = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(read_error)?
        .get(url)
        .send()
        .map_err(read_error)?;
    if response.status() == StatusCode::NOT_FOUND {
        return Err(ResourceError::NotFound {
            location: location.to_owned(),
        });
    }
    let body = response
        .error_for_status()
        .map_err(read_error)?
        .bytes()
        .map_err(read_error)?;
    Ok(body.to_vec())
}

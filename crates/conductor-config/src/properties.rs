//! Flat key/value properties backing the task-server settings.
//!
//! The store mirrors the semantics operators expect from `.properties`
//! files: empty values count as absent, and a key without a default is only
//! reported missing when a caller asks for it.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors raised while reading or querying a [`PropertyStore`].
#[derive(Debug, Clone, Error)]
pub enum PropertyError {
    /// A required property was absent or empty.
    #[error("missing configuration property name: {key}")]
    MissingConfiguration {
        /// Property that was requested.
        key: String,
    },
    /// The properties file could not be read.
    #[error("failed to read properties file '{path}': {source}")]
    Read {
        /// File that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl PropertyError {
    /// Returns the missing key when this error reports an absent property.
    #[must_use]
    pub fn missing_key(&self) -> Option<&str> {
        match self {
            Self::MissingConfiguration { key } => Some(key.as_str()),
            Self::Read { .. } => None,
        }
    }
}

/// Immutable lookup table of task-server properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    values: BTreeMap<String, String>,
}

impl PropertyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from key/value pairs. Later pairs override earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Parses `.properties` text into a store.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self::from_pairs(parse_properties(input))
    }

    /// Reads and parses a `.properties` file.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Read`] when the file cannot be read.
    pub fn load(path: &Utf8Path) -> Result<Self, PropertyError> {
        let bytes = fs::read(path).map_err(|source| PropertyError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Ok(Self::parse(&decode_properties(&bytes)))
    }

    /// Returns a copy of the store with `key` set to `value`.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Looks up `key`, falling back to `default`.
    ///
    /// Empty values are treated as absent. When no default is supplied the
    /// lookup fails.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::MissingConfiguration`] when the key is absent
    /// or empty and `default` is `None`.
    pub fn get<'a>(&'a self, key: &str, default: Option<&'a str>) -> Result<&'a str, PropertyError> {
        match self.values.get(key).map(String::as_str) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => default.ok_or_else(|| PropertyError::MissingConfiguration {
                key: key.to_owned(),
            }),
        }
    }

    /// Looks up `key`, returning `default` when it is absent or empty.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key).map(String::as_str) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }

    /// Looks up a key that has no default.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::MissingConfiguration`] when the key is absent
    /// or empty.
    pub fn require(&self, key: &str) -> Result<&str, PropertyError> {
        self.get(key, None)
    }

    /// Iterates over keys starting with `prefix`, yielding the remainder.
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .keys()
            .filter_map(move |key| key.strip_prefix(prefix))
    }

    /// Number of stored properties, empty values included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the store holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decodes raw `.properties` bytes.
///
/// UTF-8 input is used as is. Anything else is read as ISO-8859-1, one
/// character per byte, which is the traditional encoding of the format.
#[must_use]
pub fn decode_properties(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
    }
}

/// Parses `.properties` text into ordered key/value pairs.
///
/// Supports `#`/`!` comments, `=`/`:`/whitespace separators, backslash line
/// continuations and the usual escapes (`\t`, `\n`, `\r`, `\f`, `\uXXXX`).
#[must_use]
pub fn parse_properties(input: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut logical = String::new();
    let mut continuing = false;

    for raw in input.lines() {
        let line = raw.trim_start_matches(is_blank);
        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        let trailing = line.chars().rev().take_while(|ch| *ch == '\\').count();
        if trailing.is_multiple_of(2) {
            logical.push_str(line);
            continuing = false;
        } else {
            logical.push_str(line.strip_suffix('\\').unwrap_or(line));
            continuing = true;
            continue;
        }

        if let Some(pair) = split_entry(&logical) {
            pairs.push(pair);
        }
        logical.clear();
    }

    if !logical.is_empty()
        && let Some(pair) = split_entry(&logical)
    {
        pairs.push(pair);
    }

    pairs
}

const fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\u{000C}')
}

fn split_entry(line: &str) -> Option<(String, String)> {
    if line.is_empty() {
        return None;
    }

    let mut escaped = false;
    let mut boundary = None;
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == '=' || ch == ':' || is_blank(ch) {
            boundary = Some((index, ch));
            break;
        }
    }

    let Some((index, separator)) = boundary else {
        return Some((unescape(line), String::new()));
    };

    let (key, rest) = line.split_at(index);
    let mut value = rest
        .strip_prefix(separator)
        .unwrap_or(rest)
        .trim_start_matches(is_blank);
    if is_blank(separator)
        && let Some(stripped) = value.strip_prefix(['=', ':'])
    {
        value = stripped.trim_start_matches(is_blank);
    }

    Some((unescape(key), unescape(value)))
}

fn unescape(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => decoded.push('\t'),
            Some('n') => decoded.push('\n'),
            Some('r') => decoded.push('\r'),
            Some('f') => decoded.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded_char) => decoded.push(decoded_char),
                    None => {
                        decoded.push_str("\\u");
                        decoded.push_str(&hex);
                    }
                }
            }
            Some(other) => decoded.push(other),
            None => {}
        }
    }
    decoded
}

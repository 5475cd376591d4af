// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie handling.
//!
//! The rides API is authenticated by replaying the cookies of an existing
//! browser session. Extracting those cookies from a browser profile is the
//! job of an external collaborator; this module only defines the contract it
//! must satisfy and the [`CookieJar`] value the rest of the pipeline consumes.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AppError, Result};

/// An ordered set of `name=value` cookies scoped to the rides domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    // Insertion order is preserved so the serialized header is stable.
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Build a jar from `(name, value)` pairs, keeping their order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Serialize as a single `Cookie` header value: `name=value; name=value`.
    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Source of an authenticated cookie set.
///
/// Contract: an implementation must return at least one cookie for the rides
/// domain or fail. An empty jar is never a valid success, and cookies from
/// unrelated domains must not be returned.
pub trait CookieSource {
    fn load(&self) -> Result<CookieJar>;
}

/// Cookie source backed by a JSON file containing a flat `name -> value` map.
///
/// This is the pass-through used by the CLI; browser profile extraction lives
/// outside this crate and can export into this format.
pub struct FileCookieSource {
    path: std::path::PathBuf,
}

impl FileCookieSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CookieSource for FileCookieSource {
    fn load(&self) -> Result<CookieJar> {
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::Authentication(format!(
                "Cannot read cookie file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let map: BTreeMap<String, String> = serde_json::from_str(&data).map_err(|e| {
            AppError::Authentication(format!(
                "Cookie file {} is not a JSON object of strings: {}",
                self.path.display(),
                e
            ))
        })?;

        if map.is_empty() {
            return Err(AppError::Authentication(format!(
                "Cookie file {} contains no cookies. {}",
                self.path.display(),
                AppError::AUTH_HINT
            )));
        }

        Ok(CookieJar::from_pairs(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_preserves_order() {
        let jar = CookieJar::from_pairs([("sid", "abc123"), ("csid", "xyz"), ("geo", "US")]);
        assert_eq!(jar.header_value(), "sid=abc123; csid=xyz; geo=US");
    }

    #[test]
    fn test_empty_jar_serializes_to_empty_header() {
        let jar = CookieJar::default();
        assert!(jar.is_empty());
        assert_eq!(jar.header_value(), "");
    }

    #[test]
    fn test_file_source_rejects_empty_map() {
        let dir = std::env::temp_dir().join("ride-reporter-cookie-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.json");
        std::fs::write(&path, "{}").unwrap();

        let err = FileCookieSource::new(&path).load().unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_file_source_loads_map() {
        let dir = std::env::temp_dir().join("ride-reporter-cookie-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jar.json");
        std::fs::write(&path, r#"{"sid":"abc","csid":"def"}"#).unwrap();

        let jar = FileCookieSource::new(&path).load().unwrap();
        assert_eq!(jar.len(), 2);
        assert_eq!(jar.header_value(), "csid=def; sid=abc");
    }
}

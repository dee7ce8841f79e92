//! HTTP headers attached to metadata and byte requests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered header map sent with every request
///
/// Header names are compared case-insensitively; the most recent insert wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHeaders {
    entries: BTreeMap<String, String>,
}

impl AuthHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers carrying a bearer token
    #[must_use]
    pub fn bearer(token: &str) -> Self {
        let mut headers = Self::new();
        headers.insert("Authorization", format!("Bearer {token}"));
        headers
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.entries.insert(name, value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of these headers with `extra` layered on top
    #[must_use]
    pub fn merged_with<'a>(&self, extra: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        let mut merged = self.clone();
        for (name, value) in extra {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

//! The token map: custom-property names to their raw declared values.
//!
//! Names are stored without the leading `--`, exactly as they appear inside
//! a `var(--name)` reference. Lookups accept either spelling.

use std::collections::BTreeMap;

/// Custom-property declarations from one stylesheet block.
///
/// Built once per audit run and never mutated while resolving. Iteration is
/// in name order so reports are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    tokens: BTreeMap<String, String>,
}

impl TokenMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` with `value`. A later declaration replaces an earlier
    /// one, the same way the cascade treats duplicates within a block.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.tokens.insert(bare(name.as_ref()).to_string(), value.into());
    }

    /// The raw declared value of `name` (`--name` also accepted).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tokens.get(bare(name)).map(String::as_str)
    }

    /// The stored name and raw value of `name`, borrowed from the map.
    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<(&str, &str)> {
        self.tokens
            .get_key_value(bare(name))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(bare(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn bare(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("--").unwrap_or(name)
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for TokenMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl<K: AsRef<str>, V: Into<String>, const N: usize> From<[(K, V); N]> for TokenMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

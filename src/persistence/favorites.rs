//! Favorites list persistence.
//!
//! Favorites are user-curated statements keyed by name, stored as one JSON
//! object under a single key and rewritten wholesale on every update.

use super::KeyValueStore;
use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Saved statements, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    entries: BTreeMap<String, String>,
}

impl Favorites {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the statement saved under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Returns a copy of this list with `statement` saved under `name`.
    pub fn with(&self, name: impl Into<String>, statement: impl Into<String>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(name.into(), statement.into());
        Self { entries }
    }

    /// Returns a copy of this list without `name`.
    pub fn without(&self, name: &str) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(name);
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, statement)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, statement)| (name.as_str(), statement.as_str()))
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for Favorites {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, statement)| (name.into(), statement.into()))
                .collect(),
        }
    }
}

/// Loads the favorites list stored under `key`.
///
/// An absent or malformed value yields an empty list; only store failures
/// are returned as errors.
pub async fn load_favorites(store: &dyn KeyValueStore, key: &str) -> Result<Favorites> {
    let Some(raw) = store.get(key).await? else {
        debug!("No favorites stored under '{key}'");
        return Ok(Favorites::new());
    };

    match serde_json::from_str::<Favorites>(&raw) {
        Ok(favorites) => {
            debug!("Loaded {} favorites", favorites.len());
            Ok(favorites)
        }
        Err(e) => {
            warn!("Ignoring malformed favorites under '{key}': {e}");
            Ok(Favorites::new())
        }
    }
}

/// Writes the whole favorites list under `key`.
pub async fn save_favorites(
    store: &dyn KeyValueStore,
    key: &str,
    favorites: &Favorites,
) -> Result<()> {
    let raw = serde_json::to_string(favorites)
        .map_err(|e| ConsoleError::internal(format!("Failed to encode favorites: {e}")))?;
    store.set(key, &raw).await
}

//! Resolution cache: static and generated locator records.
//!
//! Static entries are authored by hand and always win. Generated entries are
//! written by the resolver and consulted only when no static entry exists.
//! There is no eviction; an entry lives as long as the cache does, or longer
//! when persisted with [`LocatorCache::save_generated`].
//!
//! The cache is `Send + Sync` so several resolvers (one per test context)
//! can share it behind an `Arc`. Locks are held only for the map operation
//! itself, never across a document query.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::LocatorConfig;
use crate::key::{CacheKey, KeyOrigin, ResolvedKey, GENERATED_PREFIX};
use crate::record::LocatorRecord;
use crate::result::LocatorResult;

#[derive(Debug, Clone)]
enum GeneratedEntry {
    Record(Arc<LocatorRecord>),
    /// Loaded from disk, parsed on first lookup
    Unparsed(Value),
}

/// Outcome of a generated-namespace lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Usable record found
    Hit(Arc<LocatorRecord>),
    /// No entry, or only a degenerate one
    Miss,
    /// A persisted entry failed to parse and has been discarded
    Invalid {
        /// Parser message
        reason: String,
    },
}

/// Process-wide store of resolved locator records
#[derive(Debug, Default)]
pub struct LocatorCache {
    statics: RwLock<HashMap<CacheKey, Arc<LocatorRecord>>>,
    generated: RwLock<HashMap<CacheKey, GeneratedEntry>>,
}

impl LocatorCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with the static locators of `config`
    #[must_use]
    pub fn from_config(config: &LocatorConfig) -> Self {
        let cache = Self::new();
        for (key, record) in config.static_locators() {
            cache.seed_static(key.clone(), record.clone());
        }
        cache
    }

    /// Add a static entry. Degenerate records are ignored.
    pub fn seed_static(&self, key: CacheKey, record: LocatorRecord) {
        if record.is_degenerate(&key) {
            tracing::warn!(key = %key, "ignoring degenerate static locator");
            return;
        }
        let _ = self
            .statics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(record));
    }

    /// Static entry for `key`
    #[must_use]
    pub fn get_static(&self, key: &CacheKey) -> Option<Arc<LocatorRecord>> {
        self.statics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Generated entry for `key`.
    ///
    /// Persisted entries are parsed on first lookup; one that fails to parse
    /// is dropped and reported as [`CacheLookup::Invalid`] so the caller can
    /// regenerate it.
    pub fn get_generated(&self, key: &CacheKey) -> CacheLookup {
        {
            let generated = self.generated.read().unwrap_or_else(PoisonError::into_inner);
            match generated.get(key) {
                None => return CacheLookup::Miss,
                Some(GeneratedEntry::Record(record)) => return usable(key, record),
                Some(GeneratedEntry::Unparsed(_)) => {}
            }
        }

        let mut generated = self.generated.write().unwrap_or_else(PoisonError::into_inner);
        let Some(GeneratedEntry::Unparsed(raw)) = generated.get(key) else {
            // Another writer got here first.
            return match generated.get(key) {
                Some(GeneratedEntry::Record(record)) => usable(key, record),
                _ => CacheLookup::Miss,
            };
        };
        match serde_json::from_value::<LocatorRecord>(raw.clone()) {
            Ok(record) => {
                let record = Arc::new(record);
                let _ = generated.insert(key.clone(), GeneratedEntry::Record(Arc::clone(&record)));
                usable(key, &record)
            }
            Err(e) => {
                let _ = generated.remove(key);
                CacheLookup::Invalid {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Store a generated record, returning the shared copy
    pub fn store_generated(&self, key: CacheKey, record: LocatorRecord) -> Arc<LocatorRecord> {
        let record = Arc::new(record);
        let _ = self
            .generated
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, GeneratedEntry::Record(Arc::clone(&record)));
        record
    }

    /// Record for a key returned by the resolver, looked up in the namespace
    /// the key is tagged with
    #[must_use]
    pub fn get(&self, resolved: &ResolvedKey) -> Option<Arc<LocatorRecord>> {
        match resolved.origin {
            KeyOrigin::Static => self.get_static(&resolved.key),
            KeyOrigin::Generated => match self.get_generated(&resolved.key) {
                CacheLookup::Hit(record) => Some(record),
                CacheLookup::Miss | CacheLookup::Invalid { .. } => None,
            },
        }
    }

    /// Number of static entries
    #[must_use]
    pub fn static_len(&self) -> usize {
        self.statics.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of generated entries, parsed or not
    #[must_use]
    pub fn generated_len(&self) -> usize {
        self.generated.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Write every generated entry to `path` as a JSON object keyed by the
    /// namespaced key (`auto.loc...`).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_generated(&self, path: impl AsRef<Path>) -> LocatorResult<usize> {
        let snapshot: BTreeMap<String, Value> = {
            let generated = self.generated.read().unwrap_or_else(PoisonError::into_inner);
            let snapshot = generated
                .iter()
                .map(|(key, entry)| -> Result<(String, Value), serde_json::Error> {
                    let value = match entry {
                        GeneratedEntry::Record(record) => serde_json::to_value(record.as_ref())?,
                        GeneratedEntry::Unparsed(raw) => raw.clone(),
                    };
                    Ok((format!("{GENERATED_PREFIX}{key}"), value))
                })
                .collect::<Result<_, _>>()?;
            snapshot
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path.as_ref(), json)?;
        tracing::debug!(path = %path.as_ref().display(), entries = snapshot.len(), "saved generated locators");
        Ok(snapshot.len())
    }

    /// Load generated entries previously written by
    /// [`save_generated`](Self::save_generated). A missing file loads
    /// nothing. Entries with a malformed key are skipped with a warning;
    /// records are validated lazily on lookup. Returns the number loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not a JSON object.
    pub fn load_generated(&self, path: impl AsRef<Path>) -> LocatorResult<usize> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let entries: BTreeMap<String, Value> = serde_json::from_str(&content)?;
        let mut count = 0;
        let mut generated = self.generated.write().unwrap_or_else(PoisonError::into_inner);
        for (name, raw) in entries {
            let stripped = name.strip_prefix(GENERATED_PREFIX).unwrap_or(&name);
            match CacheKey::from_authored(stripped) {
                Ok(key) => {
                    let _ = generated.insert(key, GeneratedEntry::Unparsed(raw));
                    count += 1;
                }
                Err(err) => tracing::warn!(key = %name, error = %err, "skipping persisted entry with malformed key"),
            }
        }
        tracing::debug!(path = %path.display(), entries = count, "loaded generated locators");
        Ok(count)
    }
}

fn usable(key: &CacheKey, record: &Arc<LocatorRecord>) -> CacheLookup {
    if record.is_degenerate(key) {
        CacheLookup::Miss
    } else {
        CacheLookup::Hit(Arc::clone(record))
    }
}

//! Load-once cache for named external datasets.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DatasetError {
    /// The host collaborator failed to produce the dataset. Never cached;
    /// a later call retries the load.
    #[error("failed to load dataset '{identifier}'")]
    Load {
        identifier: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// An immutable named table. Cloning shares the underlying data.
#[derive(Debug, Clone)]
pub struct Dataset {
    identifier: Arc<str>,
    table: Arc<Value>,
}

impl Dataset {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn table(&self) -> &Value {
        &self.table
    }
}

/// Host-supplied collaborator that physically reads a dataset.
pub type DatasetLoader =
    dyn Fn(&str) -> Result<Value, Box<dyn StdError + Send + Sync>> + Send + Sync;

/// Read-through cache keyed by dataset identifier.
///
/// Loads are serialized under the cache mutex, so the collaborator runs at
/// most once per identifier and no caller can observe a partially loaded
/// table. The loader must not call back into [`DatasetCache::load`].
/// Entries are never evicted or reloaded; a long-running server that needs
/// fresh data must restart.
pub struct DatasetCache {
    loader: Box<DatasetLoader>,
    loaded: Mutex<HashMap<String, Dataset>>,
}

impl DatasetCache {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn(&str) -> Result<Value, Box<dyn StdError + Send + Sync>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn load(&self, identifier: &str) -> Result<Dataset, DatasetError> {
        let mut loaded = self.loaded.lock();
        if let Some(dataset) = loaded.get(identifier) {
            return Ok(dataset.clone());
        }

        let started = Instant::now();
        let table = (self.loader)(identifier).map_err(|source| DatasetError::Load {
            identifier: identifier.to_string(),
            source,
        })?;
        let dataset = Dataset {
            identifier: Arc::from(identifier),
            table: Arc::new(table),
        };
        loaded.insert(identifier.to_string(), dataset.clone());
        info!(
            dataset = identifier,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.loaded.lock().contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.loaded.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;

    fn counting_cache(calls: Arc<AtomicUsize>) -> DatasetCache {
        DatasetCache::new(move |identifier| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "identifier": identifier, "rows": [1, 2, 3] }))
        })
    }

    #[test]
    fn test_load_is_read_through_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(calls.clone());

        let first = cache.load("jyrjola/lipasto/emissions").unwrap();
        let second = cache.load("jyrjola/lipasto/emissions").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.table(), second.table());

        cache.load("jyrjola/aluesarjat/pop_forecast").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_first_load_invokes_loader_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(calls.clone());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let dataset = cache.load("jyrjola/lipasto/emissions").unwrap();
                    assert_eq!(dataset.table()["rows"], json!([1, 2, 3]));
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_failure_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = calls.clone();
        let cache = DatasetCache::new(move |identifier| {
            if inner.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("upstream storage unreachable".into())
            } else {
                Ok(json!({ "identifier": identifier }))
            }
        });

        let err = cache.load("jyrjola/energia/helen").unwrap_err();
        assert!(matches!(err, DatasetError::Load { .. }));
        assert!(!cache.is_loaded("jyrjola/energia/helen"));

        // The failure was not cached; the retry goes back to the loader.
        cache.load("jyrjola/energia/helen").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

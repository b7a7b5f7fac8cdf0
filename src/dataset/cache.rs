use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;

use crate::dataset::Row;

/// Parsed table plus the file mtime it was parsed from.
struct CachedTable {
    rows: Arc<Vec<Row>>,
    modified: SystemTime,
}

/// Read-through cache of parsed dataset tables keyed by file path.
///
/// Datasets are refreshed out-of-band, so entries are validated against the
/// file's mtime on every read. Readers share an `Arc` snapshot; a refresh
/// publishes a whole new table in one map insert, so concurrent readers
/// never observe a partially parsed table.
#[derive(Clone, Default)]
pub struct RowCache {
    entries: Arc<DashMap<PathBuf, CachedTable>>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path, modified: SystemTime) -> Option<Arc<Vec<Row>>> {
        let entry = self.entries.get(path)?;
        if entry.modified == modified {
            Some(entry.rows.clone())
        } else {
            // stale — drop the ref before removing
            drop(entry);
            self.entries.remove(path);
            None
        }
    }

    pub fn insert(&self, path: PathBuf, modified: SystemTime, rows: Arc<Vec<Row>>) {
        self.entries.insert(path, CachedTable { rows, modified });
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

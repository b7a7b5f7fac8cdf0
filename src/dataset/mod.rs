//! Dataset access — resolves `(brand, dataset)` to tabular rows.
//!
//! The storage medium is a directory per brand under a configured root,
//! holding CSV files. The rest of the system only sees ordered key→value
//! rows and three distinguishable failure modes: missing root, missing
//! file, unparsable content.

pub mod cache;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::guard::canonicalize;
use crate::errors::AppError;
use cache::RowCache;

/// One dataset row: column name → value, in file column order.
pub type Row = serde_json::Map<String, Value>;

/// Well-known dataset names referenced by the core.
pub const MASTER_DATASET: &str = "master_vehicle_data";

#[async_trait]
pub trait DatasetAccess: Send + Sync {
    /// Rows of the named dataset for a brand.
    async fn rows(&self, brand: &str, dataset: &str) -> Result<Vec<Row>, AppError>;

    /// Brands with a dataset directory present under the root, sorted.
    async fn brands(&self) -> Result<Vec<String>, AppError>;
}

/// File-backed dataset store with an mtime-validated cache of parsed rows.
#[derive(Clone)]
pub struct CsvStore {
    root: PathBuf,
    cache: RowCache,
}

impl CsvStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache: RowCache::new(),
        }
    }
}

#[async_trait]
impl DatasetAccess for CsvStore {
    async fn rows(&self, brand: &str, dataset: &str) -> Result<Vec<Row>, AppError> {
        let root = self.root.clone();
        let path = root
            .join(canonicalize(brand))
            .join(format!("{}.csv", dataset));
        let cache = self.cache.clone();
        let brand = canonicalize(brand);
        let dataset = dataset.to_string();

        // File I/O and parsing are blocking — keep them off the dispatch path.
        let rows = tokio::task::spawn_blocking(move || -> Result<Arc<Vec<Row>>, AppError> {
            if !root.is_dir() {
                return Err(AppError::DatasetStoreUnavailable(
                    root.display().to_string(),
                ));
            }

            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => AppError::DatasetNotFound {
                        brand: brand.clone(),
                        dataset: dataset.clone(),
                    },
                    // Anything else (permissions, a file where a directory
                    // should be) is operator-correctable infrastructure.
                    _ => AppError::DatasetStoreUnavailable(e.to_string()),
                })?;

            if let Some(rows) = cache.get(&path, modified) {
                return Ok(rows);
            }

            let rows = read_table(&path).map_err(|reason| AppError::DatasetCorrupt {
                dataset: dataset.clone(),
                reason,
            })?;
            let rows = Arc::new(rows);
            cache.insert(path, modified, rows.clone());
            Ok(rows)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

        Ok((*rows).clone())
    }

    async fn brands(&self) -> Result<Vec<String>, AppError> {
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || {
            let entries = std::fs::read_dir(&root).map_err(|_| {
                AppError::DatasetStoreUnavailable(root.display().to_string())
            })?;

            let mut brands: Vec<String> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .filter_map(|e| e.file_name().into_string().ok())
                .map(|name| canonicalize(&name))
                .collect();
            brands.sort();
            Ok(brands)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    }
}

fn read_table(path: &std::path::Path) -> Result<Vec<Row>, String> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| e.to_string())?;
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let mut row = Row::new();
        for (name, field) in headers.iter().zip(record.iter()) {
            row.insert(name.to_string(), parse_field(field));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Best-effort typing of a CSV field: integer, then float, else string.
fn parse_field(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = field.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = field.parse::<f64>() {
        return Value::from(f);
    }
    Value::from(field)
}

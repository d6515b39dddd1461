//! Dataset manifests: the `table,path` listing at the root of each version.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::{
    error::DriftError,
    io_utils::{self, CsvFormat},
};

pub const TABLE_COLUMN: &str = "table";
pub const PATH_COLUMN: &str = "path";

/// Table name → storage directory (relative to the version root).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    tables: BTreeMap<String, String>,
}

impl Manifest {
    /// Loads a manifest, skipping rows whose path is empty. Extra columns are
    /// ignored; a missing `table` or `path` column is an error.
    pub fn load(path: &Path, format: &CsvFormat) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, format.delimiter)
            .with_context(|| format!("Opening manifest {path:?}"))?;
        let headers = io_utils::reader_headers(&mut reader, format.encoding)?;
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DriftError::ManifestColumnMissing {
                    path: path.to_path_buf(),
                    column: name,
                })
        };
        let table_idx = column(TABLE_COLUMN)?;
        let path_idx = column(PATH_COLUMN)?;

        let mut tables = BTreeMap::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {path:?}", idx + 2))?;
            let values = io_utils::decode_record(&record, format.encoding)?;
            let name = values.get(table_idx).map(|s| s.trim()).unwrap_or_default();
            let storage = values.get(path_idx).map(|s| s.trim()).unwrap_or_default();
            if name.is_empty() || storage.is_empty() {
                debug!("Skipping manifest row {} without table or path", idx + 2);
                continue;
            }
            if tables.insert(name.to_string(), storage.to_string()).is_some() {
                warn!("Table '{name}' listed more than once in {path:?}; keeping the last entry");
            }
        }
        Ok(Self { tables })
    }

    pub fn path(&self, table: &str) -> Option<&str> {
        self.tables.get(table).map(String::as_str)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn paths(&self) -> BTreeSet<&str> {
        self.tables.values().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Manifest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tables: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_skips_rows_without_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("csv_structure.csv");
        fs::write(
            &path,
            "table,path,description\norders,data/orders,Orders\nnotes,,Free text\nregions,  ,x\n",
        )
        .unwrap();
        let manifest = Manifest::load(&path, &CsvFormat::default()).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.path("orders"), Some("data/orders"));
        assert!(!manifest.contains("notes"));
    }

    #[test]
    fn load_rejects_manifest_without_path_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("csv_structure.csv");
        fs::write(&path, "table,location\norders,data/orders\n").unwrap();
        let err = Manifest::load(&path, &CsvFormat::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DriftError>(),
            Some(DriftError::ManifestColumnMissing { column: "path", .. })
        ));
    }
}

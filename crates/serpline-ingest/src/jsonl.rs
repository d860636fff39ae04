//! Local JSONL-backed clients
//!
//! File-per-table implementations of the client seams for development runs
//! and tests: each table or collection is one append-only `.jsonl` file
//! under a root directory, one JSON object per line.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::sink::{DocumentStoreClient, LoadJobConfig, TableReference, WarehouseClient};
use crate::transform::Document;

/// Warehouse client writing day-partitionable tables as JSONL files.
pub struct JsonlWarehouse {
    root: PathBuf,
}

impl JsonlWarehouse {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn table_path(&self, table: &TableReference) -> PathBuf {
        // Flatten `dataset.table` into one filename
        let name = match &table.dataset_name {
            Some(dataset) => format!("{dataset}__{}", table.table_name),
            None => table.table_name.clone(),
        };
        self.root.join(format!("{name}.jsonl"))
    }
}

impl WarehouseClient for JsonlWarehouse {
    fn table_reference(&self, table_name: &str, dataset_name: Option<&str>) -> TableReference {
        TableReference::new(table_name, dataset_name)
    }

    fn has_table(&self, table: &TableReference) -> Result<bool> {
        Ok(self.table_path(table).exists())
    }

    fn count_rows_for_date(&self, table: &TableReference, date: NaiveDate) -> Result<u64> {
        let path = self.table_path(table);
        let day = date.format("%Y-%m-%d").to_string();
        let file =
            File::open(&path).with_context(|| format!("cannot open {}", path.display()))?;

        let mut count = 0u64;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: Document = serde_json::from_str(&line)
                .with_context(|| format!("malformed record in {}", path.display()))?;
            if record.get("date").and_then(|v| v.as_str()) == Some(day.as_str()) {
                count += 1;
            }
        }
        Ok(count)
    }

    fn load_table(
        &self,
        records: &[Document],
        table: &TableReference,
        _config: &LoadJobConfig,
    ) -> Result<()> {
        let path = self.table_path(table);
        append_jsonl(&self.root, &path, records)
    }
}

/// Document store client appending collections as JSONL files.
pub struct JsonlDocumentStore {
    root: PathBuf,
}

impl JsonlDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl"))
    }
}

impl DocumentStoreClient for JsonlDocumentStore {
    fn insert_documents(&self, collection: &str, documents: Vec<Document>) -> Result<()> {
        let path = self.collection_path(collection);
        append_jsonl(&self.root, &path, &documents)
    }
}

/// Append records to a JSONL file, creating the root directory on demand.
fn append_jsonl(root: &Path, path: &Path, records: &[Document]) -> Result<()> {
    fs::create_dir_all(root)
        .with_context(|| format!("cannot create directory {}", root.display()))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut buf = String::new();
    for record in records {
        buf.push_str(&serde_json::to_string(record)?);
        buf.push('\n');
    }
    file.write_all(buf.as_bytes())
        .with_context(|| format!("cannot append to {}", path.display()))?;
    Ok(())
}

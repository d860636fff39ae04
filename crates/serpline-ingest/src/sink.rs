//! Destination sinks
//!
//! The two write paths (warehouse, document store) are a closed variant
//! set: [`Destination`] owns the existence guard, the record shaping, and
//! the write for its variant, so the three coupled decision points cannot
//! drift apart. Clients are injected on construction.

use anyhow::Result;
use chrono::NaiveDate;

use crate::error::JobError;
use crate::job::{DestinationSpec, JobDescriptor};
use crate::transform::{self, Document};

/// Identifies a warehouse destination table. Resolution of an unspecified
/// dataset is delegated to the warehouse client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    pub dataset_name: Option<String>,
    pub table_name: String,
}

impl TableReference {
    pub fn new(table_name: impl Into<String>, dataset_name: Option<&str>) -> Self {
        Self {
            dataset_name: dataset_name.map(str::to_string),
            table_name: table_name.into(),
        }
    }

    /// `dataset.table`, or just `table` when no dataset is set.
    pub fn qualified_name(&self) -> String {
        match &self.dataset_name {
            Some(dataset) => format!("{dataset}.{}", self.table_name),
            None => self.table_name.clone(),
        }
    }
}

impl std::fmt::Display for TableReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionGranularity {
    Day,
}

/// Time partitioning applied to a warehouse load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePartitioning {
    pub field: String,
    pub granularity: PartitionGranularity,
}

/// Load settings for one warehouse write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJobConfig {
    pub write_disposition: WriteDisposition,
    pub time_partitioning: TimePartitioning,
}

impl LoadJobConfig {
    /// Append-only load into day partitions keyed by `field`.
    pub fn day_partitioned_append(field: &str) -> Self {
        Self {
            write_disposition: WriteDisposition::Append,
            time_partitioning: TimePartitioning {
                field: field.to_string(),
                granularity: PartitionGranularity::Day,
            },
        }
    }
}

/// Warehouse client seam. Implementations render their own query dialect;
/// `load_table` must block until the load job completes.
pub trait WarehouseClient: Send + Sync {
    fn table_reference(&self, table_name: &str, dataset_name: Option<&str>) -> TableReference;

    fn has_table(&self, table: &TableReference) -> Result<bool>;

    /// Count rows in `table` whose `date` column equals `date`.
    fn count_rows_for_date(&self, table: &TableReference, date: NaiveDate) -> Result<u64>;

    /// Append `records` to `table`. Blocks until the load completes;
    /// failure is fatal to the calling job.
    fn load_table(
        &self,
        records: &[Document],
        table: &TableReference,
        config: &LoadJobConfig,
    ) -> Result<()>;
}

/// Document store client seam. Unordered bulk append, no upsert;
/// duplicate documents across repeated runs are accepted.
pub trait DocumentStoreClient: Send + Sync {
    fn insert_documents(&self, collection: &str, documents: Vec<Document>) -> Result<()>;
}

/// A job's write path with its injected client.
pub enum Destination<'a> {
    Warehouse {
        client: &'a dyn WarehouseClient,
        table: TableReference,
    },
    DocumentStore {
        client: &'a dyn DocumentStoreClient,
        collection: String,
    },
}

impl<'a> std::fmt::Debug for Destination<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Warehouse { table, .. } => f
                .debug_struct("Warehouse")
                .field("table", table)
                .finish_non_exhaustive(),
            Destination::DocumentStore { collection, .. } => f
                .debug_struct("DocumentStore")
                .field("collection", collection)
                .finish_non_exhaustive(),
        }
    }
}

impl<'a> Destination<'a> {
    /// Bind a job's destination spec to the matching injected client.
    pub fn for_job(
        job: &JobDescriptor,
        warehouse: Option<&'a dyn WarehouseClient>,
        documents: Option<&'a dyn DocumentStoreClient>,
    ) -> Result<Self, JobError> {
        match &job.destination {
            DestinationSpec::Warehouse { table, dataset } => {
                let client = warehouse.ok_or_else(|| {
                    JobError::Config(format!(
                        "{}: warehouse destination configured but no warehouse client provided",
                        job.property
                    ))
                })?;
                let table = client.table_reference(table, dataset.as_deref());
                Ok(Self::Warehouse { client, table })
            }
            DestinationSpec::DocumentStore { collection } => {
                let client = documents.ok_or_else(|| {
                    JobError::Config(format!(
                        "{}: document-store destination configured but no document client provided",
                        job.property
                    ))
                })?;
                Ok(Self::DocumentStore {
                    client,
                    collection: collection.clone(),
                })
            }
        }
    }

    /// Day-level existence guard.
    ///
    /// Warehouse: absent table means no data; otherwise rows counted for
    /// the target day. Document stores accept append-only duplicate writes
    /// and always proceed.
    pub fn has_existing_data(&self, date: NaiveDate) -> Result<bool> {
        match self {
            Self::Warehouse { client, table } => {
                if !client.has_table(table)? {
                    return Ok(false);
                }
                Ok(client.count_rows_for_date(table, date)? > 0)
            }
            Self::DocumentStore { .. } => Ok(false),
        }
    }

    /// Shape one page of raw rows for this destination.
    pub fn transform(
        &self,
        rows: &[crate::api::ReportRow],
        property: &str,
        date: NaiveDate,
        dimensions: &[String],
        search_type: &str,
    ) -> Vec<Document> {
        match self {
            Self::Warehouse { .. } => {
                transform::table_records(rows, property, date, dimensions, search_type)
            }
            Self::DocumentStore { .. } => {
                transform::document_records(rows, property, date, dimensions, search_type)
            }
        }
    }

    /// Write one page of shaped records.
    ///
    /// The writer has no idempotency of its own; duplicate-day protection
    /// for warehouses is the guard's job.
    pub fn write(&self, records: Vec<Document>) -> Result<()> {
        match self {
            Self::Warehouse { client, table } => client.load_table(
                &records,
                table,
                &LoadJobConfig::day_partitioned_append("date"),
            ),
            Self::DocumentStore { client, collection } => {
                client.insert_documents(collection, records)
            }
        }
    }

    /// Destination label for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Warehouse { table, .. } => format!("warehouse table {table}"),
            Self::DocumentStore { collection, .. } => format!("collection {collection}"),
        }
    }
}

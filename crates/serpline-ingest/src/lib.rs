//! Serpline Ingest - search analytics ingestion pipeline
//!
//! Pulls search-performance rows for configured web properties from a
//! paginated reporting API and loads them once per day into either a
//! day-partitioned warehouse table or a document collection.
//!
//! # Example
//!
//! ```ignore
//! use serpline_ingest::{Config, run};
//!
//! let config = Config::load()?;
//! let api = serpline_ingest::api::HttpAnalyticsClient::new(&config.api.base_url);
//! let store = serpline_ingest::jsonl::JsonlDocumentStore::new("./data");
//! let summary = run(&config, &api, None, Some(&store), &progress)?;
//! println!("{} rows loaded", summary.total_rows);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod job;
pub mod jsonl;
pub mod runner;
pub mod sink;
pub mod transform;
pub mod worker;

// Re-exports
pub use config::Config;
pub use error::JobError;
pub use job::{DestinationSpec, JobDescriptor};
pub use runner::{Summary, run};
pub use sink::{Destination, DocumentStoreClient, TableReference, WarehouseClient};
pub use transform::Document;

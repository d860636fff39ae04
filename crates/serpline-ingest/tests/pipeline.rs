//! End-to-end pipeline tests over the runner with scripted collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::NaiveDate;
use serpline_core::{HttpError, ProgressContext};
use serpline_ingest::api::{
    AnalyticsRequest, AnalyticsResponse, ReportRow, RowKeys, SearchAnalyticsApi,
};
use serpline_ingest::config::{Config, DestinationKind, PropertySettings};
use serpline_ingest::sink::{
    DocumentStoreClient, LoadJobConfig, TableReference, WarehouseClient,
};
use serpline_ingest::transform::Document;

/// API double replaying a fixed script and recording every request.
struct ScriptedApi {
    responses: Mutex<VecDeque<AnalyticsResponse>>,
    requests: Mutex<Vec<(String, AnalyticsRequest)>>,
}

impl ScriptedApi {
    fn new(responses: Vec<AnalyticsResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn queried_properties(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

impl SearchAnalyticsApi for ScriptedApi {
    fn query(
        &self,
        property: &str,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse, HttpError> {
        self.requests
            .lock()
            .unwrap()
            .push((property.to_string(), request.clone()));
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

/// In-memory warehouse keyed by qualified table name.
#[derive(Default)]
struct MemoryWarehouse {
    tables: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryWarehouse {
    fn with_existing(table: &str, date: &str) -> Self {
        let mut doc = Document::new();
        doc.insert("date".to_string(), serde_json::Value::from(date));
        let wh = Self::default();
        wh.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), vec![doc]);
        wh
    }

    fn rows(&self, table: &str) -> Vec<Document> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

impl WarehouseClient for MemoryWarehouse {
    fn table_reference(&self, table_name: &str, dataset_name: Option<&str>) -> TableReference {
        TableReference::new(table_name, dataset_name)
    }

    fn has_table(&self, table: &TableReference) -> anyhow::Result<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .contains_key(&table.qualified_name()))
    }

    fn count_rows_for_date(&self, table: &TableReference, date: NaiveDate) -> anyhow::Result<u64> {
        let day = date.format("%Y-%m-%d").to_string();
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&table.qualified_name())
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.get("date").and_then(|v| v.as_str()) == Some(day.as_str()))
                    .count() as u64
            })
            .unwrap_or(0))
    }

    fn load_table(
        &self,
        records: &[Document],
        table: &TableReference,
        _config: &LoadJobConfig,
    ) -> anyhow::Result<()> {
        self.tables
            .lock()
            .unwrap()
            .entry(table.qualified_name())
            .or_default()
            .extend(records.iter().cloned());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl DocumentStoreClient for MemoryDocumentStore {
    fn insert_documents(&self, collection: &str, documents: Vec<Document>) -> anyhow::Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(())
    }
}

fn short_page(rows: usize) -> AnalyticsResponse {
    let row = ReportRow {
        keys: RowKeys::Split(vec![
            "/docs".to_string(),
            "mobile".to_string(),
            "rust".to_string(),
            "US".to_string(),
        ]),
        clicks: 2.0,
        impressions: 40.0,
        ctr: 0.05,
        position: 5.5,
    };
    AnalyticsResponse {
        rows: Some(vec![row; rows]),
    }
}

fn warehouse_config(entries: Vec<(&str, PropertySettings)>) -> Config {
    let mut config = Config::default();
    config.destination.kind = DestinationKind::Warehouse;
    for (property, settings) in entries {
        config
            .properties
            .entry(property.to_string())
            .or_default()
            .push(settings);
    }
    config
}

fn with_table(table: &str) -> PropertySettings {
    PropertySettings {
        tablename: Some(table.to_string()),
        search_types: Some(vec!["web".to_string()]),
        ..PropertySettings::default()
    }
}

#[test]
fn config_error_in_one_job_does_not_stop_the_next() {
    // First property (iteration order) misses its tablename; the second
    // must still fetch and load.
    let config = warehouse_config(vec![
        (
            "https://a.example.com/",
            PropertySettings {
                search_types: Some(vec!["web".to_string()]),
                ..PropertySettings::default()
            },
        ),
        ("https://b.example.com/", with_table("search_b")),
    ]);

    let api = ScriptedApi::new(vec![short_page(3)]);
    let warehouse = MemoryWarehouse::default();
    let progress = ProgressContext::new();

    let summary =
        serpline_ingest::run(&config, &api, Some(&warehouse), None, &progress).unwrap();

    assert_eq!(summary.total_jobs, 2);
    assert_eq!(summary.failed_jobs, 1);
    assert_eq!(summary.loaded_jobs, 1);
    assert_eq!(summary.total_rows, 3);

    assert_eq!(
        api.queried_properties(),
        vec!["https://b.example.com/".to_string()]
    );
    assert_eq!(warehouse.rows("search_b").len(), 3);
}

#[test]
fn existing_data_skips_job_without_api_calls() {
    let config = warehouse_config(vec![("https://a.example.com/", with_table("search_a"))]);

    // Seed today's target date (default lookback 3) as already loaded
    let date = chrono::Utc::now().date_naive() - chrono::Days::new(3);
    let warehouse =
        MemoryWarehouse::with_existing("search_a", &date.format("%Y-%m-%d").to_string());
    let api = ScriptedApi::new(vec![short_page(3)]);
    let progress = ProgressContext::new();

    let summary =
        serpline_ingest::run(&config, &api, Some(&warehouse), None, &progress).unwrap();

    assert_eq!(summary.skipped_jobs, 1);
    assert_eq!(summary.loaded_jobs, 0);
    assert_eq!(summary.failed_jobs, 0);
    assert_eq!(api.request_count(), 0);
    // only the seeded row remains
    assert_eq!(warehouse.rows("search_a").len(), 1);
}

#[test]
fn warehouse_rows_are_flat_records() {
    let config = warehouse_config(vec![("https://a.example.com/", with_table("search_a"))]);
    let api = ScriptedApi::new(vec![short_page(1)]);
    let warehouse = MemoryWarehouse::default();
    let progress = ProgressContext::new();

    serpline_ingest::run(&config, &api, Some(&warehouse), None, &progress).unwrap();

    let rows = warehouse.rows("search_a");
    assert_eq!(rows.len(), 1);
    let rec = &rows[0];
    assert_eq!(rec["page"], "/docs");
    assert_eq!(rec["device"], "mobile");
    assert_eq!(rec["query"], "rust");
    assert_eq!(rec["country"], "US");
    assert_eq!(rec["searchType"], "web");
    assert_eq!(rec["property"], "https://a.example.com/");
    assert!(rec.get("dimensions").is_none());
}

#[test]
fn document_store_rows_nest_dimensions() {
    let mut config = Config::default();
    config.properties.insert(
        "https://a.example.com/".to_string(),
        vec![PropertySettings {
            search_types: Some(vec!["web".to_string()]),
            ..PropertySettings::default()
        }],
    );

    let api = ScriptedApi::new(vec![short_page(2)]);
    let store = MemoryDocumentStore::default();
    let progress = ProgressContext::new();

    let summary = serpline_ingest::run(&config, &api, None, Some(&store), &progress).unwrap();

    assert_eq!(summary.loaded_jobs, 1);
    assert_eq!(summary.total_rows, 2);

    let collections = store.collections.lock().unwrap();
    let docs = &collections["search_console"];
    assert_eq!(docs.len(), 2);
    let nested = docs[0]["dimensions"].as_object().unwrap();
    assert_eq!(nested["page"], "/docs");
    assert_eq!(nested["country"], "US");
    assert_eq!(docs[0]["clicks"], 2.0);
}

#[test]
fn settings_list_produces_one_job_each() {
    let config = warehouse_config(vec![
        ("https://a.example.com/", with_table("search_a")),
        ("https://a.example.com/", with_table("search_a_pages")),
    ]);

    let api = ScriptedApi::new(vec![short_page(1), short_page(1)]);
    let warehouse = MemoryWarehouse::default();
    let progress = ProgressContext::new();

    let summary =
        serpline_ingest::run(&config, &api, Some(&warehouse), None, &progress).unwrap();

    assert_eq!(summary.total_jobs, 2);
    assert_eq!(summary.loaded_jobs, 2);
    assert_eq!(warehouse.rows("search_a").len(), 1);
    assert_eq!(warehouse.rows("search_a_pages").len(), 1);
}

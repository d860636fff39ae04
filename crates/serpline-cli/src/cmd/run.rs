//! `serpline run` - import all configured properties

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use serpline_core::SharedProgress;
use serpline_ingest::api::HttpAnalyticsClient;
use serpline_ingest::config::DestinationKind;
use serpline_ingest::jsonl::{JsonlDocumentStore, JsonlWarehouse};
use serpline_ingest::{Config, DocumentStoreClient, WarehouseClient};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Root directory for the local JSONL destination backend
    #[arg(long, default_value = "./data")]
    pub out_dir: PathBuf,

    /// Number of parallel jobs (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

pub fn run(args: RunArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let mut config = config.clone();
    if let Some(workers) = args.workers {
        config.workers.default = workers;
    }

    let api = build_api_client(&config)?;

    let warehouse = JsonlWarehouse::new(&args.out_dir);
    let documents = JsonlDocumentStore::new(&args.out_dir);
    let (warehouse, documents): (
        Option<&dyn WarehouseClient>,
        Option<&dyn DocumentStoreClient>,
    ) = match config.destination.kind {
        DestinationKind::Warehouse => (Some(&warehouse), None),
        DestinationKind::DocumentStore => (None, Some(&documents)),
    };

    let summary = serpline_ingest::run(&config, &api, warehouse, documents, progress)?;

    if summary.failed_jobs > 0 {
        anyhow::bail!("{} job(s) failed", summary.failed_jobs);
    }
    Ok(())
}

/// Build the HTTP client with per-property bearer tokens.
///
/// Credential files hold a single access token line; obtaining and
/// refreshing tokens is outside this tool.
fn build_api_client(config: &Config) -> Result<HttpAnalyticsClient> {
    let mut api = HttpAnalyticsClient::new(&config.api.base_url);

    if let Some(path) = &config.api.credentials {
        api = api.with_default_token(read_token(path)?);
    }

    for (property, settings_list) in &config.properties {
        // First credentialed settings entry wins for the property
        if let Some(path) = settings_list.iter().find_map(|s| s.credentials.as_ref()) {
            api = api.with_token(property, read_token(path)?);
        }
    }
    Ok(api)
}

fn read_token(path: &Path) -> Result<String> {
    let token = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read credential file {}", path.display()))?;
    Ok(token.trim().to_string())
}

//! serpline - search analytics ingestion CLI
//!
//! Imports search-performance rows for configured web properties from the
//! reporting API into a warehouse table or document collection, once per
//! day per property.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use serpline_ingest::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "serpline")]
#[command(about = "Search analytics ingestion pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./serpline.toml or ~/.config/serpline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Import all configured properties for their target day
    Run(cmd::run::RunArgs),
    /// Show the resolved job plan without importing
    Plan,
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(serpline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress lines show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    serpline_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Plan => cmd::plan::run(&config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["API base URL", &config.api.base_url]);
            table.add_row(vec![
                "Default credentials",
                &config
                    .api
                    .credentials
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "not set".to_string()),
            ]);
            table.add_row(vec![
                "Destination",
                match config.destination.kind {
                    serpline_ingest::config::DestinationKind::Warehouse => "warehouse",
                    serpline_ingest::config::DestinationKind::DocumentStore => "document-store",
                },
            ]);
            table.add_row(vec!["Collection", &config.destination.collection]);
            table.add_row(vec![
                "Workers",
                &format!("{} (max: {})", config.workers.default, config.workers.max),
            ]);
            table.add_row(vec!["Properties", &config.properties.len().to_string()]);
            table.add_row(vec!["Jobs", &config.job_count().to_string()]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}

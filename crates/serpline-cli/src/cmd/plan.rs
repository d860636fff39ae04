//! `serpline plan` - show the resolved job plan

use anyhow::Result;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use serpline_ingest::job::{DestinationSpec, JobDescriptor};
use serpline_ingest::Config;

pub fn run(config: &Config) -> Result<()> {
    let today = chrono::Utc::now().date_naive();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Property").fg(Color::Cyan),
            Cell::new("Destination").fg(Color::Cyan),
            Cell::new("Date").fg(Color::Cyan),
            Cell::new("Search types").fg(Color::Cyan),
            Cell::new("Dimensions").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);

    for (property, settings_list) in &config.properties {
        for settings in settings_list {
            match JobDescriptor::resolve(property, settings, &config.destination) {
                Ok(job) => {
                    let destination = match &job.destination {
                        DestinationSpec::Warehouse { table, dataset } => match dataset {
                            Some(ds) => format!("{ds}.{table}"),
                            None => table.clone(),
                        },
                        DestinationSpec::DocumentStore { collection } => collection.clone(),
                    };
                    let date = job
                        .request_date(today)
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "out of range".to_string());
                    table.add_row(vec![
                        Cell::new(property),
                        Cell::new(destination),
                        Cell::new(date),
                        Cell::new(job.search_types.join(", ")),
                        Cell::new(job.dimensions.join(", ")),
                        Cell::new("ok").fg(Color::Green),
                    ]);
                }
                Err(e) => {
                    table.add_row(vec![
                        Cell::new(property),
                        Cell::new("-"),
                        Cell::new("-"),
                        Cell::new("-"),
                        Cell::new("-"),
                        Cell::new(format!("{e}")).fg(Color::Red),
                    ]);
                }
            }
        }
    }

    if config.job_count() == 0 {
        log::warn!("No properties configured");
    }

    eprintln!("\n{table}");
    Ok(())
}

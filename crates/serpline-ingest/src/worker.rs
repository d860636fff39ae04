//! Per-job import
//!
//! Runs one resolved job end to end: existence guard, then the
//! search-type and page loops, handing each fetched page straight to the
//! destination. Nothing is retained in memory across pages.

use chrono::NaiveDate;
use indicatif::ProgressBar;
use serpline_core::fmt_num;

use crate::api::{AnalyticsRequest, ROW_LIMIT, SearchAnalyticsApi};
use crate::error::JobError;
use crate::job::JobDescriptor;
use crate::sink::Destination;

/// Counters for one completed job.
#[derive(Debug, Default, Clone, Copy)]
pub struct JobStats {
    pub rows: usize,
    pub pages: usize,
}

/// How one job ended (short of failing).
#[derive(Debug, Clone, Copy)]
pub enum JobOutcome {
    Loaded(JobStats),
    /// The destination already holds rows for the target day
    SkippedExisting,
}

/// Import one job for its target day.
pub fn run_job(
    job: &JobDescriptor,
    date: NaiveDate,
    api: &dyn SearchAnalyticsApi,
    dest: &Destination,
    pb: &ProgressBar,
) -> Result<JobOutcome, JobError> {
    if dest.has_existing_data(date).map_err(JobError::Sink)? {
        log::info!(
            "{}: {} already has data for {date}, skipping",
            job.property,
            dest.describe()
        );
        return Ok(JobOutcome::SkippedExisting);
    }

    let mut stats = JobStats::default();

    for search_type in &job.search_types {
        // Row offset restarts for every search type
        let mut page_index = 0usize;

        loop {
            pb.set_message(format!(
                "{search_type}: page {} ({} rows)",
                page_index + 1,
                fmt_num(stats.rows)
            ));

            let request = AnalyticsRequest::for_page(job, date, search_type, page_index);
            let response = api.query(&job.property, &request)?;

            // No rows field at all: the explicit end-of-data signal
            let Some(rows) = response.rows else { break };

            let fetched = rows.len();
            stats.pages += 1;
            stats.rows += fetched;

            if !rows.is_empty() {
                let records =
                    dest.transform(&rows, &job.property, date, &job.dimensions, search_type);
                dest.write(records).map_err(JobError::Sink)?;
            }

            log::debug!(
                "{}: {search_type} page {} -> {fetched} rows",
                job.property,
                page_index + 1
            );

            // A short page means everything was fetched
            if fetched < ROW_LIMIT {
                break;
            }
            page_index += 1;
        }
    }

    log::info!(
        "{}: loaded {} rows over {} pages into {}",
        job.property,
        fmt_num(stats.rows),
        stats.pages,
        dest.describe()
    );
    Ok(JobOutcome::Loaded(stats))
}

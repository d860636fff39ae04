//! Run orchestration
//!
//! Resolves every configured (property, settings) pair into a job,
//! dispatches the jobs to a bounded worker pool, and reports a summary.
//! Jobs are isolated: one failing job never stops the others.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use serpline_core::{ProgressContext, fmt_num};

use crate::api::SearchAnalyticsApi;
use crate::config::Config;
use crate::error::JobError;
use crate::job::JobDescriptor;
use crate::sink::{Destination, DocumentStoreClient, WarehouseClient};
use crate::worker::{self, JobOutcome};

/// Run execution summary
#[derive(Debug)]
pub struct Summary {
    pub total_jobs: usize,
    pub loaded_jobs: usize,
    pub skipped_jobs: usize,
    pub failed_jobs: usize,
    pub total_rows: usize,
    pub elapsed: std::time::Duration,
}

impl Summary {
    pub fn log(&self) {
        log::info!("=== Import Summary ===");
        log::info!(
            "Jobs: {}/{} loaded ({} skipped, {} failed)",
            self.loaded_jobs,
            self.total_jobs,
            self.skipped_jobs,
            self.failed_jobs
        );
        log::info!("Rows: {}", fmt_num(self.total_rows));
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }
}

/// Run every configured import job.
///
/// `warehouse` and `documents` are the injected client handles; only the
/// one matching the configured destination kind is required.
pub fn run(
    config: &Config,
    api: &dyn SearchAnalyticsApi,
    warehouse: Option<&dyn WarehouseClient>,
    documents: Option<&dyn DocumentStoreClient>,
    progress: &ProgressContext,
) -> Result<Summary> {
    let start = Instant::now();
    let today = Utc::now().date_naive();

    // Resolve all jobs up front; configuration errors fail their job here,
    // before any network traffic, without touching the rest.
    let mut jobs: Vec<JobDescriptor> = Vec::new();
    let mut early_failures = 0usize;
    let mut total_jobs = 0usize;

    for (property, settings_list) in &config.properties {
        for settings in settings_list {
            total_jobs += 1;
            match JobDescriptor::resolve(property, settings, &config.destination) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    log::error!("{property}: {e}");
                    early_failures += 1;
                }
            }
        }
    }

    let workers = config
        .workers
        .default
        .clamp(1, config.workers.max.max(1));
    log::info!(
        "Importing {} job(s) with {} worker(s)",
        jobs.len(),
        workers
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("Failed to create thread pool")?;

    let loaded_counter = AtomicUsize::new(0);
    let skipped_counter = AtomicUsize::new(0);
    let failed_counter = AtomicUsize::new(0);
    let rows_counter = AtomicUsize::new(0);

    pool.install(|| {
        jobs.par_iter().for_each(|job| {
            let pb = progress.job_bar(&job.label());

            let result = Destination::for_job(job, warehouse, documents)
                .and_then(|dest| run_one(job, today, api, &dest, &pb));

            match result {
                Ok(JobOutcome::Loaded(stats)) => {
                    loaded_counter.fetch_add(1, Ordering::Relaxed);
                    rows_counter.fetch_add(stats.rows, Ordering::Relaxed);
                }
                Ok(JobOutcome::SkippedExisting) => {
                    skipped_counter.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    failed_counter.fetch_add(1, Ordering::Relaxed);
                    log::error!("{}: {e}", job.property);
                }
            }
            pb.finish_and_clear();
        });
    });

    let summary = Summary {
        total_jobs,
        loaded_jobs: loaded_counter.load(Ordering::Relaxed),
        skipped_jobs: skipped_counter.load(Ordering::Relaxed),
        failed_jobs: failed_counter.load(Ordering::Relaxed) + early_failures,
        total_rows: rows_counter.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(summary)
}

/// Resolve the job's target day and run it.
fn run_one(
    job: &JobDescriptor,
    today: chrono::NaiveDate,
    api: &dyn SearchAnalyticsApi,
    dest: &Destination,
    pb: &indicatif::ProgressBar,
) -> Result<JobOutcome, JobError> {
    let date = job.request_date(today).ok_or_else(|| {
        JobError::Config(format!(
            "{}: dateDaysAgo {} is out of range",
            job.property, job.lookback_days
        ))
    })?;
    worker::run_job(job, date, api, dest, pb)
}

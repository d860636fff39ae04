//! Job descriptors
//!
//! A [`JobDescriptor`] is one fully-resolved import job: a (property,
//! settings) pair with every override applied and validated. Descriptors
//! are built fresh per run and never mutated afterwards.

use std::path::PathBuf;

use chrono::{Days, NaiveDate};

use crate::config::{
    DEFAULT_DIMENSIONS, DEFAULT_LOOKBACK_DAYS, DEFAULT_SEARCH_TYPES, DestinationConfig,
    DestinationKind, PropertySettings,
};
use crate::error::JobError;

/// Where one job writes its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationSpec {
    Warehouse {
        table: String,
        dataset: Option<String>,
    },
    DocumentStore {
        collection: String,
    },
}

/// One fully-resolved import job.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// URI-like identifier of the site
    pub property: String,
    /// Days back from today for the single-day request window
    pub lookback_days: u32,
    /// Breakdown axes, in request and decode order
    pub dimensions: Vec<String>,
    /// Search types iterated in configured order
    pub search_types: Vec<String>,
    /// Extra aggregation request parameter; empty = unset
    pub aggregation_mode: String,
    pub destination: DestinationSpec,
    /// Per-property credential file, consumed by the caller's token loading
    pub credentials: Option<PathBuf>,
}

impl JobDescriptor {
    /// Resolve one (property, settings) pair into a job, applying defaults
    /// for absent overrides and validating the result.
    pub fn resolve(
        property: &str,
        settings: &PropertySettings,
        destination: &DestinationConfig,
    ) -> Result<Self, JobError> {
        let lookback_days = settings.date_days_ago.unwrap_or(DEFAULT_LOOKBACK_DAYS);

        let dimensions = match &settings.dimensions {
            Some(dims) => dims.clone(),
            None => DEFAULT_DIMENSIONS.iter().map(|s| s.to_string()).collect(),
        };
        if dimensions.is_empty() {
            return Err(JobError::Config(format!(
                "{property}: dimensions must not be empty"
            )));
        }
        for (i, dim) in dimensions.iter().enumerate() {
            if dimensions[..i].contains(dim) {
                return Err(JobError::Config(format!(
                    "{property}: duplicate dimension '{dim}'"
                )));
            }
        }

        let search_types = match &settings.search_types {
            Some(types) => types.clone(),
            None => DEFAULT_SEARCH_TYPES.iter().map(|s| s.to_string()).collect(),
        };
        if search_types.is_empty() {
            return Err(JobError::Config(format!(
                "{property}: searchTypes must not be empty"
            )));
        }

        let aggregation_mode = settings.aggregation_type.clone().unwrap_or_default();

        let destination = match destination.kind {
            DestinationKind::Warehouse => match settings.tablename.as_deref() {
                Some(table) if !table.is_empty() => DestinationSpec::Warehouse {
                    table: table.to_string(),
                    dataset: settings.dataset.clone(),
                },
                _ => {
                    return Err(JobError::Config(format!(
                        "{property}: missing tablename for warehouse destination"
                    )));
                }
            },
            DestinationKind::DocumentStore => DestinationSpec::DocumentStore {
                collection: destination.collection.clone(),
            },
        };

        Ok(Self {
            property: property.to_string(),
            lookback_days,
            dimensions,
            search_types,
            aggregation_mode,
            destination,
            credentials: settings.credentials.clone(),
        })
    }

    /// Target day for this job: `today - lookback_days`.
    pub fn request_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_sub_days(Days::new(u64::from(self.lookback_days)))
    }

    /// Short display label for logs and progress lines.
    pub fn label(&self) -> String {
        match &self.destination {
            DestinationSpec::Warehouse { table, .. } => {
                format!("{} -> {table}", self.property)
            }
            DestinationSpec::DocumentStore { collection } => {
                format!("{} -> {collection}", self.property)
            }
        }
    }
}

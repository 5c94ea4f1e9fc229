//! Report configuration.
//!
//! Stored as a plain JSON object on disk; every key is optional:
//! ```json
//! {
//!   "data_path": "assets/static-coffee-data.json",
//!   "outliers_path": "assets/outliers.json",
//!   "country": "Colombia",
//!   "year": 2015,
//!   "metric": "Aroma",
//!   "min_sample_size": 5
//! }
//! ```
//! Environment variables override the file, and CLI flags override both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyzers::types::{CountryRankingParams, YearlyFilter};
use crate::error::StatsError;
use crate::outliers::DEFAULT_IQR_MULTIPLIER;
use crate::record::{Metric, YearSelection};

pub const DATA_PATH_ENV: &str = "COFFEE_DATA_PATH";
pub const OUTLIERS_PATH_ENV: &str = "COFFEE_OUTLIERS_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub data_path: Option<String>,
    pub outliers_path: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    /// `None` ranks across all years.
    pub year: Option<i32>,
    pub metric: Metric,
    pub min_sample_size: usize,
    pub iqr_multiplier: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            outliers_path: None,
            country: None,
            region: None,
            year: None,
            metric: Metric::Total,
            min_sample_size: 3,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config '{path}'"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config '{path}'"))?;
        Ok(config)
    }

    /// Overrides dataset paths from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overrides dataset paths from `lookup`; empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key| lookup(key).filter(|v: &String| !v.is_empty());
        if let Some(path) = non_empty(DATA_PATH_ENV) {
            self.data_path = Some(path);
        }
        if let Some(path) = non_empty(OUTLIERS_PATH_ENV) {
            self.outliers_path = Some(path);
        }
    }

    pub fn validate(&self) -> std::result::Result<(), StatsError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(StatsError::InvalidArgument(format!(
                "iqr_multiplier must be a non-negative number, got {}",
                self.iqr_multiplier
            )));
        }
        Ok(())
    }

    pub fn yearly_filter(&self) -> YearlyFilter {
        YearlyFilter {
            country: self.country.clone(),
            region: self.region.clone(),
        }
    }

    pub fn ranking_params(&self) -> CountryRankingParams {
        CountryRankingParams {
            year: YearSelection::from(self.year),
            metric: self.metric,
            min_sample_size: self.min_sample_size,
        }
    }
}

//! The cleaned dataset handle.
//!
//! ```text
//!  dataset.json ──┐
//!                 ├─ parse ─► clean (minus outliers) ─► Dataset
//!  outliers.json ─┘                                       │
//!                                     engines borrow &Dataset.records()
//! ```
//!
//! A [`Dataset`] is built once and never mutated; every engine takes the
//! records it needs as an explicit argument.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use crate::analyzers::utility::title_case;
use crate::outliers::{Subtraction, subtract_outliers};
use crate::parser::parse_records;
use crate::record::CoffeeRecord;

#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<CoffeeRecord>,
    raw_len: usize,
    unmatched_outliers: usize,
}

/// A region choice with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOption {
    pub value: String,
    pub label: String,
}

impl Dataset {
    /// Removes `outliers` from `raw` and freezes the result.
    pub fn new(raw: Vec<CoffeeRecord>, outliers: &[CoffeeRecord]) -> Result<Self> {
        let raw_len = raw.len();
        let Subtraction { kept, unmatched } = if outliers.is_empty() {
            Subtraction {
                kept: raw,
                unmatched: 0,
            }
        } else {
            subtract_outliers(&raw, outliers).context("removing outliers")?
        };

        if unmatched > 0 {
            warn!(
                outliers = outliers.len(),
                unmatched,
                "Some outlier entries matched no dataset row"
            );
        }
        info!(
            raw = raw_len,
            outliers = outliers.len(),
            removed = raw_len - kept.len(),
            kept = kept.len(),
            "Dataset ready"
        );
        Ok(Self {
            records: kept,
            raw_len,
            unmatched_outliers: unmatched,
        })
    }

    /// Reads the dataset and an optional outlier list from JSON files.
    pub fn load(data_path: &Path, outliers_path: Option<&Path>) -> Result<Self> {
        let raw = read_records(data_path)?;
        let outliers = match outliers_path {
            Some(path) => read_records(path)?,
            None => Vec::new(),
        };
        Self::new(raw, &outliers)
    }

    pub fn records(&self) -> &[CoffeeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row count before outlier removal.
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    /// Distinct outlier entries that matched no raw row.
    pub fn unmatched_outliers(&self) -> usize {
        self.unmatched_outliers
    }

    pub fn removed(&self) -> usize {
        self.raw_len - self.records.len()
    }

    /// Sorted unique country names.
    pub fn countries(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(CoffeeRecord::country)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Sorted unique non-empty regions within `country`.
    pub fn regions(&self, country: &str) -> Vec<RegionOption> {
        self.records
            .iter()
            .filter(|r| r.country() == Some(country))
            .filter_map(CoffeeRecord::region)
            .filter(|region| !region.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|region| RegionOption {
                value: region.to_string(),
                label: title_case(region),
            })
            .collect()
    }

    /// Sorted unique years.
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .filter_map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn read_records(path: &Path) -> Result<Vec<CoffeeRecord>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_records(&bytes).with_context(|| format!("decoding {}", path.display()))
}

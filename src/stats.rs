use serde::Serialize;

use crate::outliers::has_complete_structure;
use crate::record::CoffeeRecord;

/// Field coverage across a record set: how many rows carry each value the
/// engines group or average on.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub total_records: usize,
    pub complete_records: usize,

    // grouping keys
    pub with_country: usize,
    pub with_region: usize,
    pub with_year: usize,
    pub with_owner: usize,
    pub with_species: usize,
    pub with_processing_method: usize,

    // numeric fields
    pub with_altitude: usize,
    pub with_bags: usize,
    pub with_total: usize,
    pub with_all_categories: usize,
}

impl DatasetProfile {
    pub fn from_records(records: &[CoffeeRecord]) -> Self {
        let mut p = DatasetProfile {
            total_records: records.len(),
            ..Default::default()
        };

        for r in records {
            if has_complete_structure(r) {
                p.complete_records += 1;
            }
            if r.country().is_some() {
                p.with_country += 1;
            }
            if r.region().is_some_and(|region| !region.is_empty()) {
                p.with_region += 1;
            }
            if r.year.is_some() {
                p.with_year += 1;
            }
            if r.owner().is_some() {
                p.with_owner += 1;
            }
            if r.species().is_some() {
                p.with_species += 1;
            }
            if r.processing_method().is_some() {
                p.with_processing_method += 1;
            }
            if r.altitude_average().is_finite() {
                p.with_altitude += 1;
            }
            if r.data.production.bags.is_finite() {
                p.with_bags += 1;
            }
            if r.total().is_finite() {
                p.with_total += 1;
            }
            let s = &r.data.scores;
            if [
                s.aroma,
                s.flavor,
                s.aftertaste,
                s.acidity,
                s.body,
                s.balance,
                s.uniformity,
                s.sweetness,
                s.moisture,
            ]
            .iter()
            .all(|v| v.is_finite())
            {
                p.with_all_categories += 1;
            }
        }

        p
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn complete_pct(&self) -> f64 {
        Self::pct(self.complete_records, self.total_records)
    }
}

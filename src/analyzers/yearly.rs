//! Per-year score averages.

use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::types::{YearlyAverage, YearlyFilter};
use crate::analyzers::utility::round2;
use crate::record::{CoffeeRecord, Metric};

/// Running sums for one metric. NaN contributions are not counted.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FieldSum {
    sum: f64,
    count: usize,
}

impl FieldSum {
    pub(crate) fn add(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    /// 0.0 when nothing finite was added.
    pub(crate) fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[derive(Default)]
struct YearAccumulator {
    count: usize,
    fields: [FieldSum; 10],
}

/// Groups records by year and averages the total and every score category.
///
/// `country` and `region` restrict by exact match and apply independently.
/// Records without a readable year are skipped. Rows come out in ascending
/// year order; years with no matching records are absent.
pub fn average_by_year(records: &[CoffeeRecord], filter: &YearlyFilter) -> Vec<YearlyAverage> {
    let mut years: BTreeMap<i32, YearAccumulator> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        if let Some(country) = filter.country.as_deref() {
            if record.country() != Some(country) {
                continue;
            }
        }
        if let Some(region) = filter.region.as_deref() {
            if record.region() != Some(region) {
                continue;
            }
        }
        let Some(year) = record.year else {
            skipped += 1;
            continue;
        };

        let acc = years.entry(year).or_default();
        acc.count += 1;
        for (slot, metric) in acc.fields.iter_mut().zip(Metric::ALL) {
            slot.add(metric.value(record));
        }
    }

    debug!(years = years.len(), skipped, "Yearly averages grouped");

    years
        .into_iter()
        .map(|(year, acc)| {
            // Same order as Metric::ALL
            let [
                total,
                aroma,
                flavor,
                aftertaste,
                acidity,
                body,
                balance,
                uniformity,
                sweetness,
                moisture,
            ] = acc.fields.map(|field| round2(field.mean()));
            YearlyAverage {
                year,
                count: acc.count,
                total,
                aroma,
                flavor,
                aftertaste,
                acidity,
                body,
                balance,
                uniformity,
                sweetness,
                moisture,
            }
        })
        .collect()
}

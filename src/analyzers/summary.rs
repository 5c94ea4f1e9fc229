//! Single-metric dispersion summaries.

use crate::analyzers::types::MetricSummary;
use crate::analyzers::utility::{
    coefficient_of_variation, max, mean, median, min, mode, project, round2, standard_deviation,
    variance,
};
use crate::record::{CoffeeRecord, Metric};

/// Location and spread of `metric` over the finite values in `records`.
pub fn describe(records: &[CoffeeRecord], metric: Metric) -> MetricSummary {
    let values = project(records, |r| metric.value(r));
    MetricSummary {
        metric,
        count: values.len(),
        mean: round2(mean(&values)),
        median: round2(median(&values)),
        mode: mode(&values).map(round2),
        standard_deviation: round2(standard_deviation(&values)),
        variance: round2(variance(&values)),
        coefficient_of_variation: round2(coefficient_of_variation(&values)),
        min: round2(min(&values)),
        max: round2(max(&values)),
    }
}

/// [`describe`] for the total and each category.
pub fn describe_all(records: &[CoffeeRecord]) -> Vec<MetricSummary> {
    Metric::ALL.iter().map(|m| describe(records, *m)).collect()
}

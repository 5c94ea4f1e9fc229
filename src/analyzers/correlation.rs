//! Species/processing-method comparison and score correlations.

use indexmap::IndexMap;
use tracing::debug;

use crate::analyzers::types::{BestMethod, CorrelationMatrix, MethodAverage, MetricCorrelation};
use crate::analyzers::utility::{round2, round_to, sample_correlation};
use crate::analyzers::yearly::FieldSum;
use crate::error::Result;
use crate::record::{CoffeeRecord, Metric};

/// Grouping key for [`method_averages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MethodKey<'a> {
    species: &'a str,
    method: &'a str,
}

#[derive(Default)]
struct MethodAccumulator {
    count: usize,
    score: FieldSum,
    altitude_sum: f64,
}

/// Averages total score and altitude per (species, method) pair.
///
/// Records missing either key are skipped. A missing altitude counts as 0
/// rather than being excluded. Scores round to 2 decimals, altitudes to
/// whole metres. Rows follow first-seen order.
pub fn method_averages(records: &[CoffeeRecord]) -> Vec<MethodAverage> {
    let mut groups: IndexMap<MethodKey<'_>, MethodAccumulator> = IndexMap::new();

    for record in records {
        let (Some(species), Some(method)) = (record.species(), record.processing_method()) else {
            continue;
        };
        let acc = groups.entry(MethodKey { species, method }).or_default();
        acc.count += 1;
        acc.score.add(record.total());
        let altitude = record.altitude_average();
        acc.altitude_sum += if altitude.is_finite() { altitude } else { 0.0 };
    }

    debug!(pairs = groups.len(), "Species/method pairs grouped");

    groups
        .into_iter()
        .map(|(key, acc)| MethodAverage {
            species: key.species.to_string(),
            method: key.method.to_string(),
            count: acc.count,
            avg_score: round2(acc.score.mean()),
            avg_altitude: round_to(acc.altitude_sum / acc.count as f64, 0),
        })
        .collect()
}

/// Picks the highest-scoring processing method for each species.
///
/// Comparison is strict, so on an exact tie the method seen first stays.
pub fn best_method_per_species(records: &[CoffeeRecord]) -> Vec<BestMethod> {
    let mut best: IndexMap<String, MethodAverage> = IndexMap::new();

    for entry in method_averages(records) {
        match best.get_mut(&entry.species) {
            Some(current) if entry.avg_score > current.avg_score => *current = entry,
            Some(_) => {}
            None => {
                best.insert(entry.species.clone(), entry);
            }
        }
    }

    best.into_values().collect()
}

fn series(records: &[CoffeeRecord], metric: Metric) -> Vec<f64> {
    records.iter().map(|r| metric.value(r)).collect()
}

/// Pearson correlation between two score metrics across `records`.
pub fn metric_correlation(records: &[CoffeeRecord], a: Metric, b: Metric) -> Result<MetricCorrelation> {
    let correlation = sample_correlation(&series(records, a), &series(records, b))?;
    Ok(MetricCorrelation {
        a,
        b,
        correlation: round2(correlation),
    })
}

/// Correlation between average altitude and total score.
pub fn altitude_score_correlation(records: &[CoffeeRecord]) -> Result<f64> {
    let altitudes: Vec<f64> = records.iter().map(CoffeeRecord::altitude_average).collect();
    let totals = series(records, Metric::Total);
    Ok(round2(sample_correlation(&altitudes, &totals)?))
}

/// Every pairwise correlation among the total and the nine categories.
pub fn correlation_matrix(records: &[CoffeeRecord]) -> Result<CorrelationMatrix> {
    let keys = Metric::ALL.to_vec();
    let columns: Vec<Vec<f64>> = keys.iter().map(|m| series(records, *m)).collect();

    let matrix = columns
        .iter()
        .map(|a| {
            columns
                .iter()
                .map(|b| sample_correlation(a, b).map(round2))
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorrelationMatrix { keys, matrix })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(species: &str, method: &str, total: f64, altitude: f64) -> CoffeeRecord {
        let mut r = CoffeeRecord::default();
        r.data.kind.species = Some(species.into());
        r.data.kind.processing_method = Some(method.into());
        r.data.scores.total = total;
        r.location.altitude.average = altitude;
        r
    }

    #[test]
    fn test_method_averages_group_by_pair() {
        let records = vec![
            lot("Arabica", "Washed", 80.0, 1000.0),
            lot("Arabica", "Washed", 84.0, 1400.0),
            lot("Arabica", "Natural", 83.0, 1500.0),
        ];

        let rows = method_averages(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].method, "Washed");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].avg_score, 82.0);
        assert_eq!(rows[0].avg_altitude, 1200.0);
    }

    #[test]
    fn test_separator_characters_do_not_collide() {
        let records = vec![lot("a-b", "c", 80.0, 0.0), lot("a", "b-c", 90.0, 0.0)];
        assert_eq!(method_averages(&records).len(), 2);
    }

    #[test]
    fn test_missing_altitude_counts_as_zero() {
        let records = vec![
            lot("Robusta", "Washed", 80.0, 1000.0),
            lot("Robusta", "Washed", 80.0, f64::NAN),
        ];
        assert_eq!(method_averages(&records)[0].avg_altitude, 500.0);
    }

    #[test]
    fn test_records_without_species_or_method_are_skipped() {
        let mut no_method = lot("Arabica", "", 90.0, 0.0);
        no_method.data.kind.processing_method = Some(String::new());
        let mut no_species = lot("", "Washed", 90.0, 0.0);
        no_species.data.kind.species = None;

        assert!(method_averages(&[no_method, no_species]).is_empty());
    }

    #[test]
    fn test_best_method_per_species() {
        let records = vec![
            lot("Arabica", "Washed", 82.0, 0.0),
            lot("Arabica", "Natural", 85.0, 0.0),
            lot("Robusta", "Washed", 79.0, 0.0),
            lot("Arabica", "Honey", 84.0, 0.0),
        ];

        let best = best_method_per_species(&records);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].species, "Arabica");
        assert_eq!(best[0].method, "Natural");
        assert_eq!(best[1].species, "Robusta");
    }

    #[test]
    fn test_best_method_tie_keeps_first() {
        let records = vec![
            lot("Arabica", "Washed", 82.0, 0.0),
            lot("Arabica", "Natural", 82.0, 0.0),
        ];
        assert_eq!(best_method_per_species(&records)[0].method, "Washed");
    }

    #[test]
    fn test_correlation_matrix_is_symmetric_with_unit_diagonal() {
        let mut records = Vec::new();
        for i in 0..5 {
            let mut r = lot("Arabica", "Washed", 80.0 + f64::from(i), 0.0);
            let s = &mut r.data.scores;
            s.aroma = 7.0 + f64::from(i) * 0.1;
            s.flavor = 8.0 - f64::from(i) * 0.2;
            s.aftertaste = 7.5 + f64::from(i % 2);
            s.acidity = 7.0;
            records.push(r);
        }

        let m = correlation_matrix(&records).unwrap();
        assert_eq!(m.keys.len(), 10);
        assert_eq!(m.get(Metric::Total, Metric::Total), Some(1.0));
        assert_eq!(m.get(Metric::Total, Metric::Aroma), Some(1.0));
        assert_eq!(m.get(Metric::Total, Metric::Flavor), Some(-1.0));
        assert_eq!(
            m.get(Metric::Aftertaste, Metric::Total),
            m.get(Metric::Total, Metric::Aftertaste)
        );
        // constant series has no defined correlation
        assert_eq!(m.get(Metric::Acidity, Metric::Acidity), Some(0.0));
    }

    #[test]
    fn test_altitude_score_correlation() {
        let records = vec![
            lot("Arabica", "Washed", 80.0, 1000.0),
            lot("Arabica", "Washed", 82.0, 1200.0),
            lot("Arabica", "Washed", 84.0, 1400.0),
        ];
        assert_eq!(altitude_score_correlation(&records).unwrap(), 1.0);
    }

    #[test]
    fn test_metric_correlation_on_empty_input() {
        let c = metric_correlation(&[], Metric::Aroma, Metric::Body).unwrap();
        assert_eq!(c.correlation, 0.0);
    }
}

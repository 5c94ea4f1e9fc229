//! Parameter and output types for the aggregation engines.
//!
//! Output rows are flat so they serialize straight to CSV as well as JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ReportConfig;
use crate::record::{Metric, YearSelection};

/// Location restriction for the yearly averages.
#[derive(Debug, Clone, Default)]
pub struct YearlyFilter {
    pub country: Option<String>,
    pub region: Option<String>,
}

/// Mean scores over one year, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyAverage {
    pub year: i32,
    pub count: usize,
    pub total: f64,
    pub aroma: f64,
    pub flavor: f64,
    pub aftertaste: f64,
    pub acidity: f64,
    pub body: f64,
    pub balance: f64,
    pub uniformity: f64,
    pub sweetness: f64,
    pub moisture: f64,
}

impl YearlyAverage {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Total => self.total,
            Metric::Aroma => self.aroma,
            Metric::Flavor => self.flavor,
            Metric::Aftertaste => self.aftertaste,
            Metric::Acidity => self.acidity,
            Metric::Body => self.body,
            Metric::Balance => self.balance,
            Metric::Uniformity => self.uniformity,
            Metric::Sweetness => self.sweetness,
            Metric::Moisture => self.moisture,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CountryRankingParams {
    pub year: YearSelection,
    pub metric: Metric,
    /// Only applied when `year` is [`YearSelection::All`].
    pub min_sample_size: usize,
}

impl Default for CountryRankingParams {
    fn default() -> Self {
        Self {
            year: YearSelection::All,
            metric: Metric::Total,
            min_sample_size: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCountry {
    pub rank: usize,
    pub country: String,
    pub sample_size: usize,
    pub value: f64,
}

/// Top countries plus counts over everything that survived the filter.
#[derive(Debug, Clone, Serialize)]
pub struct CountryRanking {
    pub metric: Metric,
    pub year: YearSelection,
    pub qualifying_countries: usize,
    pub qualifying_records: usize,
    pub countries: Vec<RankedCountry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedOwner {
    pub rank: usize,
    pub owner: String,
    pub total_bags: u64,
    /// Country of the last record seen for this owner.
    pub country: Option<String>,
}

/// Averages for one (species, processing method) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodAverage {
    pub species: String,
    pub method: String,
    pub count: usize,
    pub avg_score: f64,
    pub avg_altitude: f64,
}

/// The winning method for a species.
pub type BestMethod = MethodAverage;

/// Dispersion figures for one metric, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: Option<f64>,
    pub standard_deviation: f64,
    pub variance: f64,
    pub coefficient_of_variation: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCorrelation {
    pub a: Metric,
    pub b: Metric,
    pub correlation: f64,
}

/// Pairwise correlations; `matrix[i][j]` pairs `keys[i]` with `keys[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub keys: Vec<Metric>,
    pub matrix: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        let i = self.keys.iter().position(|k| *k == a)?;
        let j = self.keys.iter().position(|k| *k == b)?;
        Some(self.matrix[i][j])
    }
}

/// Everything the dashboard shows, computed in one pass over the dataset.
#[derive(Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub raw_records: usize,
    pub removed_outliers: usize,
    pub records: usize,
    pub config: ReportConfig,
    pub yearly_averages: Vec<YearlyAverage>,
    pub country_ranking: CountryRanking,
    pub owner_ranking: Vec<RankedOwner>,
    pub best_methods: Vec<BestMethod>,
    pub summaries: Vec<MetricSummary>,
    pub altitude_score_correlation: f64,
    pub correlation_matrix: CorrelationMatrix,
}

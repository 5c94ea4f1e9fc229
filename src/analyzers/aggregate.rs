use crate::analyzers::correlation::{
    altitude_score_correlation, best_method_per_species, correlation_matrix,
};
use crate::analyzers::ranking::{rank_countries, rank_owners_by_volume};
use crate::analyzers::summary::describe_all;
use crate::analyzers::types::DashboardReport;
use crate::analyzers::yearly::average_by_year;
use crate::config::ReportConfig;
use crate::dataset::Dataset;
use chrono::Utc;
use tracing::info;

/// Runs every engine over `dataset` with the parameters in `config`.
///
/// Each engine recomputes from the full record slice; nothing is cached
/// between calls.
pub fn build_report(dataset: &Dataset, config: &ReportConfig) -> anyhow::Result<DashboardReport> {
    config.validate()?;
    let records = dataset.records();

    let yearly_averages = average_by_year(records, &config.yearly_filter());
    let country_ranking = rank_countries(records, &config.ranking_params());
    let owner_ranking = rank_owners_by_volume(records);
    let best_methods = best_method_per_species(records);
    let summaries = describe_all(records);
    let altitude_score_correlation = altitude_score_correlation(records)?;
    let correlation_matrix = correlation_matrix(records)?;

    info!(
        records = records.len(),
        years = yearly_averages.len(),
        countries = country_ranking.countries.len(),
        species = best_methods.len(),
        "Report built"
    );

    Ok(DashboardReport {
        generated_at: Utc::now(),
        raw_records: dataset.raw_len(),
        removed_outliers: dataset.removed(),
        records: records.len(),
        config: config.clone(),
        yearly_averages,
        country_ranking,
        owner_ranking,
        best_methods,
        summaries,
        altitude_score_correlation,
        correlation_matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CoffeeRecord;

    fn lot(country: &str, owner: &str, year: i32, total: f64) -> CoffeeRecord {
        let mut r = CoffeeRecord::default();
        r.location.country = Some(country.into());
        r.location.altitude.average = 1200.0 + total;
        r.year = Some(year);
        r.data.owner = Some(owner.into());
        r.data.kind.species = Some("Arabica".into());
        r.data.kind.processing_method = Some("Washed / Wet".into());
        r.data.production.bags = 10.0;
        r.data.scores.total = total;
        r
    }

    #[test]
    fn test_build_report_runs_every_engine() {
        let raw = vec![
            lot("A", "x", 2014, 80.0),
            lot("A", "y", 2015, 82.0),
            lot("A", "x", 2015, 84.0),
            lot("B", "z", 2015, 88.0),
        ];
        let dataset = Dataset::new(raw, &[]).unwrap();

        let report = build_report(&dataset, &ReportConfig::default()).unwrap();
        assert_eq!(report.records, 4);
        assert_eq!(report.removed_outliers, 0);
        assert_eq!(report.yearly_averages.len(), 2);
        // B has one record, below the default threshold of 3
        assert_eq!(report.country_ranking.countries.len(), 1);
        assert_eq!(report.owner_ranking[0].owner, "x");
        assert_eq!(report.owner_ranking[0].total_bags, 20);
        assert_eq!(report.best_methods.len(), 1);
        assert_eq!(report.summaries.len(), 10);
        assert_eq!(report.altitude_score_correlation, 1.0);
    }

    #[test]
    fn test_build_report_on_empty_dataset() {
        let dataset = Dataset::new(Vec::new(), &[]).unwrap();
        let report = build_report(&dataset, &ReportConfig::default()).unwrap();

        assert!(report.yearly_averages.is_empty());
        assert!(report.country_ranking.countries.is_empty());
        assert!(report.owner_ranking.is_empty());
        assert!(report.best_methods.is_empty());
    }

    #[test]
    fn test_build_report_rejects_invalid_config() {
        let dataset = Dataset::new(Vec::new(), &[]).unwrap();
        let config = ReportConfig {
            iqr_multiplier: -1.0,
            ..Default::default()
        };
        assert!(build_report(&dataset, &config).is_err());
    }
}

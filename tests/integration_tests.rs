use coffee_stats::analyzers::aggregate::build_report;
use coffee_stats::analyzers::correlation::{
    best_method_per_species, correlation_matrix, method_averages, metric_correlation,
};
use coffee_stats::analyzers::ranking::{rank_countries, rank_owners_by_volume};
use coffee_stats::analyzers::summary::describe;
use coffee_stats::analyzers::types::{CountryRankingParams, YearlyFilter};
use coffee_stats::analyzers::yearly::average_by_year;
use coffee_stats::config::ReportConfig;
use coffee_stats::outliers::{canonical_form, detect_outliers};
use coffee_stats::parser::parse_records;
use coffee_stats::stats::DatasetProfile;
use coffee_stats::{Dataset, Metric, YearSelection};

fn sample_dataset() -> Dataset {
    let raw = parse_records(include_bytes!("fixtures/sample_coffee.json"))
        .expect("Failed to parse dataset");
    let outliers =
        parse_records(include_bytes!("fixtures/outliers.json")).expect("Failed to parse outliers");
    Dataset::new(raw, &outliers).expect("Failed to clean dataset")
}

#[test]
fn test_full_pipeline() {
    let dataset = sample_dataset();

    assert_eq!(dataset.raw_len(), 9);
    assert_eq!(dataset.len(), 8);
    assert_eq!(dataset.removed(), 1);
    assert!(dataset.records().iter().all(|r| r.owner() != Some("outlier farm")));
}

#[test]
fn test_load_from_files() {
    let dir = env!("CARGO_MANIFEST_DIR");
    let data = std::path::Path::new(dir).join("tests/fixtures/sample_coffee.json");
    let outliers = std::path::Path::new(dir).join("tests/fixtures/outliers.json");

    let dataset = Dataset::load(&data, Some(&outliers)).unwrap();
    assert_eq!(dataset.len(), 8);

    let unfiltered = Dataset::load(&data, None).unwrap();
    assert_eq!(unfiltered.len(), 9);
    assert_eq!(unfiltered.removed(), 0);
}

#[test]
fn test_facets() {
    let dataset = sample_dataset();

    assert_eq!(dataset.countries(), vec!["Brazil", "Colombia", "Ethiopia"]);
    assert_eq!(dataset.years(), vec![2015, 2016]);

    let labels: Vec<_> = dataset
        .regions("Colombia")
        .into_iter()
        .map(|r| r.label)
        .collect();
    assert_eq!(labels, vec!["Huila", "Narino"]);
}

#[test]
fn test_yearly_averages() {
    let dataset = sample_dataset();

    let all = average_by_year(dataset.records(), &YearlyFilter::default());
    let years: Vec<_> = all.iter().map(|row| row.year).collect();
    assert_eq!(years, vec![2015, 2016]);
    assert_eq!(all[0].count, 4);
    // 82.125 rounds half away from zero
    assert_eq!(all[0].total, 82.13);
    assert_eq!(all[1].total, 83.25);
    assert_eq!(all[1].get(Metric::Uniformity), 10.0);

    let colombia = average_by_year(
        dataset.records(),
        &YearlyFilter {
            country: Some("Colombia".into()),
            region: None,
        },
    );
    assert_eq!(colombia.len(), 2);
    assert_eq!(colombia[0].total, 81.75);
    assert_eq!(colombia[1].total, 83.5);

    let narino = average_by_year(
        dataset.records(),
        &YearlyFilter {
            country: None,
            region: Some("narino".into()),
        },
    );
    assert_eq!(narino.len(), 1);
    assert_eq!(narino[0].year, 2015);
}

#[test]
fn test_country_ranking_all_years_applies_threshold() {
    let dataset = sample_dataset();

    let ranking = rank_countries(dataset.records(), &CountryRankingParams::default());

    let names: Vec<_> = ranking.countries.iter().map(|c| c.country.as_str()).collect();
    assert_eq!(names, vec!["Ethiopia", "Colombia"]);
    assert_eq!(ranking.countries[0].rank, 1);
    assert_eq!(ranking.countries[0].value, 85.0);
    assert_eq!(ranking.countries[1].sample_size, 3);
    assert_eq!(ranking.qualifying_countries, 2);
    assert_eq!(ranking.qualifying_records, 6);
}

#[test]
fn test_country_ranking_single_year_ignores_threshold() {
    let dataset = sample_dataset();

    let ranking = rank_countries(
        dataset.records(),
        &CountryRankingParams {
            year: YearSelection::Year(2015),
            metric: Metric::Total,
            min_sample_size: 3,
        },
    );

    let names: Vec<_> = ranking.countries.iter().map(|c| c.country.as_str()).collect();
    assert_eq!(names, vec!["Ethiopia", "Colombia", "Brazil"]);
    assert_eq!(ranking.countries[1].value, 81.75);
    assert_eq!(ranking.countries[2].rank, 3);
}

#[test]
fn test_owner_ranking() {
    let dataset = sample_dataset();

    let owners = rank_owners_by_volume(dataset.records());

    let rows: Vec<_> = owners
        .iter()
        .map(|o| (o.rank, o.owner.as_str(), o.total_bags))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, "minas trading", 750),
            (2, "yirga union", 650),
            (3, "andes coop", 500),
            (4, "sur estate", 100),
            (5, "guji farms", 50),
        ]
    );
    assert_eq!(owners[0].country.as_deref(), Some("Brazil"));
}

#[test]
fn test_methods() {
    let dataset = sample_dataset();

    let pairs = method_averages(dataset.records());
    assert_eq!(pairs.len(), 4);
    assert_eq!(pairs[0].avg_score, 84.0);
    assert_eq!(pairs[0].avg_altitude, 1767.0);
    assert_eq!(pairs[1].avg_score, 83.33);
    // missing altitude counts as zero
    assert_eq!(pairs[3].method, "Pulped natural / honey");
    assert_eq!(pairs[3].avg_altitude, 0.0);

    let best = best_method_per_species(dataset.records());
    let winners: Vec<_> = best
        .iter()
        .map(|b| (b.species.as_str(), b.method.as_str()))
        .collect();
    assert_eq!(
        winners,
        vec![("Arabica", "Washed / Wet"), ("Robusta", "Natural / Dry")]
    );
}

#[test]
fn test_statistics_and_correlation() {
    let dataset = sample_dataset();

    let summary = describe(dataset.records(), Metric::Uniformity);
    assert_eq!(summary.count, 8);
    assert_eq!(summary.mean, 10.0);
    assert_eq!(summary.standard_deviation, 0.0);

    let same = metric_correlation(dataset.records(), Metric::Total, Metric::Total).unwrap();
    assert_eq!(same.correlation, 1.0);

    let matrix = correlation_matrix(dataset.records()).unwrap();
    assert_eq!(matrix.keys.len(), 10);
    assert_eq!(matrix.get(Metric::Total, Metric::Total), Some(1.0));
    // constant column has zero variance
    assert_eq!(matrix.get(Metric::Uniformity, Metric::Total), Some(0.0));
    assert_eq!(
        matrix.get(Metric::Total, Metric::Aroma),
        matrix.get(Metric::Aroma, Metric::Total)
    );
}

#[test]
fn test_report() {
    let dataset = sample_dataset();

    let report = build_report(&dataset, &ReportConfig::default()).unwrap();

    assert_eq!(report.raw_records, 9);
    assert_eq!(report.removed_outliers, 1);
    assert_eq!(report.records, 8);
    assert_eq!(report.yearly_averages.len(), 2);
    assert_eq!(report.country_ranking.countries.len(), 2);
    assert_eq!(report.owner_ranking.len(), 5);
    assert_eq!(report.best_methods.len(), 2);
    assert_eq!(report.summaries.len(), 10);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["country_ranking"]["year"], "all");
    assert_eq!(json["country_ranking"]["metric"], "Total");
}

#[test]
fn test_detected_outliers_clean_the_raw_data() {
    let raw = parse_records(include_bytes!("fixtures/sample_coffee.json")).unwrap();

    let flagged = detect_outliers(&raw, 0.8).unwrap();
    let flagged_forms: Vec<_> = flagged.iter().map(|r| canonical_form(r).unwrap()).collect();
    let outlier_row = canonical_form(&raw[8]).unwrap();
    assert!(flagged_forms.contains(&outlier_row));

    let cleaned = Dataset::new(raw.clone(), &flagged).unwrap();
    assert_eq!(cleaned.len(), raw.len() - flagged.len());
}

#[test]
fn test_profile() {
    let dataset = sample_dataset();

    let profile = DatasetProfile::from_records(dataset.records());
    assert_eq!(profile.total_records, 8);
    assert_eq!(profile.with_year, 8);
    // the Brazil 2016 row has a "nan" altitude
    assert_eq!(profile.with_altitude, 7);
}

#[test]
fn test_outlier_list_must_match_input_exactly() {
    let raw = parse_records(include_bytes!("fixtures/sample_coffee.json")).unwrap();
    let mut listed: serde_json::Value =
        serde_json::from_slice(include_bytes!("fixtures/outliers.json")).unwrap();
    // same row once coerced, but written differently
    listed[0]["Year"] = serde_json::json!("2014");
    listed[0]["Data"]["Production"]["Bag weight"] = serde_json::json!("60kg");
    let outliers = parse_records(&serde_json::to_vec(&listed).unwrap()).unwrap();

    let dataset = Dataset::new(raw, &outliers).unwrap();
    assert_eq!(dataset.len(), 9);
    assert_eq!(dataset.unmatched_outliers(), 1);
}

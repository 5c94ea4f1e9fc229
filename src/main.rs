//! CLI entry point for the coffee statistics tool.
//!
//! Loads the dataset once, subtracts the outlier list, and runs one engine
//! (or all of them, for `report`) with parameters taken from the config
//! file, the environment and the command line.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use coffee_stats::analyzers::aggregate::build_report;
use coffee_stats::analyzers::correlation::{
    altitude_score_correlation, best_method_per_species, correlation_matrix, method_averages,
    metric_correlation,
};
use coffee_stats::analyzers::ranking::{rank_countries, rank_owners_by_volume};
use coffee_stats::analyzers::summary::{describe, describe_all};
use coffee_stats::analyzers::yearly::average_by_year;
use coffee_stats::config::ReportConfig;
use coffee_stats::outliers::{Structural, split_outliers};
use coffee_stats::output::{print_json, print_pretty, write_csv, write_csv_to, write_json};
use coffee_stats::stats::DatasetProfile;
use coffee_stats::{CoffeeRecord, Dataset, Metric, YearSelection};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "coffee_stats")]
#[command(about = "Aggregate statistics over the coffee-quality dataset", long_about = None)]
struct Cli {
    /// JSON config file; environment and flags override it
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Dataset JSON file (falls back to COFFEE_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<String>,

    /// Outlier list JSON file (falls back to COFFEE_OUTLIERS_PATH)
    #[arg(long, global = true)]
    outliers: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[derive(Args)]
struct TableOutput {
    /// Table format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// File to write; stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the dataset with the outlier list removed
    Clean {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate an outlier list from incomplete rows and IQR fences
    DetectOutliers {
        /// Fence multiplier k in [Q1 - k*IQR, Q3 + k*IQR]
        #[arg(long)]
        iqr_multiplier: Option<f64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Field coverage of the cleaned dataset
    Profile,
    /// Selectable countries, years, and regions of one country
    Facets {
        #[arg(long)]
        country: Option<String>,
    },
    /// Average scores per year
    Yearly {
        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        region: Option<String>,

        #[command(flatten)]
        out: TableOutput,
    },
    /// Top 10 countries by a score metric
    Countries {
        /// A year, or "all"
        #[arg(short, long)]
        year: Option<YearSelection>,

        /// Total or a score category
        #[arg(short, long)]
        metric: Option<Metric>,

        /// Minimum records per country; only applies across all years
        #[arg(long)]
        min_sample_size: Option<usize>,

        #[command(flatten)]
        out: TableOutput,
    },
    /// Top 10 owners by bags produced
    Owners {
        #[command(flatten)]
        out: TableOutput,
    },
    /// Best processing method per species
    Methods {
        /// Show every (species, method) pair instead of the winners
        #[arg(long, default_value_t = false)]
        all: bool,

        #[command(flatten)]
        out: TableOutput,
    },
    /// Dispersion summary for one metric, or all of them
    Describe {
        #[arg(short, long)]
        metric: Option<Metric>,

        #[command(flatten)]
        out: TableOutput,
    },
    /// Correlation between two metrics
    Correlate {
        #[arg(default_value = "Total")]
        a: Metric,

        #[arg(default_value = "Total")]
        b: Metric,

        /// Print the full matrix over Total and the nine categories
        #[arg(long, default_value_t = false)]
        matrix: bool,

        /// Correlate average altitude with total score instead
        #[arg(long, default_value_t = false)]
        altitude: bool,
    },
    /// Run every engine and write one JSON report
    Report {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;
    let cli = Cli::parse();
    let mut config = resolve_config(&cli)?;

    match cli.command {
        Commands::Clean { output } => {
            let dataset = load_dataset(&config)?;
            emit_json(&input_rows(dataset.records())?, output.as_deref())?;
        }
        Commands::DetectOutliers {
            iqr_multiplier,
            output,
        } => {
            if let Some(k) = iqr_multiplier {
                config.iqr_multiplier = k;
            }
            config.validate()?;
            config.outliers_path = None;
            let dataset = load_dataset(&config)?;
            let (kept, flagged) = split_outliers(dataset.records(), config.iqr_multiplier)?;
            info!(
                kept = kept.len(),
                flagged = flagged.len(),
                iqr_multiplier = config.iqr_multiplier,
                "Outlier detection finished"
            );
            emit_json(&input_rows(&flagged)?, output.as_deref())?;
        }
        Commands::Profile => {
            let dataset = load_dataset(&config)?;
            let profile = DatasetProfile::from_records(dataset.records());
            print_pretty(&profile);
            info!(
                records = profile.total_records,
                complete_pct = profile.complete_pct(),
                "Dataset profile"
            );
            print_json(&profile)?;
        }
        Commands::Facets { country } => {
            let dataset = load_dataset(&config)?;
            #[derive(Serialize)]
            struct Facets {
                countries: Vec<String>,
                years: Vec<i32>,
                regions: Vec<coffee_stats::dataset::RegionOption>,
            }
            let regions = country
                .as_deref()
                .map(|c| dataset.regions(c))
                .unwrap_or_default();
            print_json(&Facets {
                countries: dataset.countries(),
                years: dataset.years(),
                regions,
            })?;
        }
        Commands::Yearly {
            country,
            region,
            out,
        } => {
            if country.is_some() {
                config.country = country;
            }
            if region.is_some() {
                config.region = region;
            }
            let dataset = load_dataset(&config)?;
            let rows = average_by_year(dataset.records(), &config.yearly_filter());
            emit_table(&rows, &out)?;
        }
        Commands::Countries {
            year,
            metric,
            min_sample_size,
            out,
        } => {
            if let Some(year) = year {
                config.year = match year {
                    YearSelection::All => None,
                    YearSelection::Year(y) => Some(y),
                };
            }
            if let Some(metric) = metric {
                config.metric = metric;
            }
            if let Some(n) = min_sample_size {
                config.min_sample_size = n;
            }
            let dataset = load_dataset(&config)?;
            let ranking = rank_countries(dataset.records(), &config.ranking_params());
            info!(
                qualifying_countries = ranking.qualifying_countries,
                qualifying_records = ranking.qualifying_records,
                "Country ranking"
            );
            match out.format {
                Format::Json => emit_json(&ranking, out.output.as_deref())?,
                Format::Csv => emit_table(&ranking.countries, &out)?,
            }
        }
        Commands::Owners { out } => {
            let dataset = load_dataset(&config)?;
            emit_table(&rank_owners_by_volume(dataset.records()), &out)?;
        }
        Commands::Methods { all, out } => {
            let dataset = load_dataset(&config)?;
            let rows = if all {
                method_averages(dataset.records())
            } else {
                best_method_per_species(dataset.records())
            };
            emit_table(&rows, &out)?;
        }
        Commands::Describe { metric, out } => {
            let dataset = load_dataset(&config)?;
            let rows = match metric {
                Some(metric) => vec![describe(dataset.records(), metric)],
                None => describe_all(dataset.records()),
            };
            emit_table(&rows, &out)?;
        }
        Commands::Correlate {
            a,
            b,
            matrix,
            altitude,
        } => {
            let dataset = load_dataset(&config)?;
            let records = dataset.records();
            if matrix {
                print_json(&correlation_matrix(records)?)?;
            } else if altitude {
                print_json(&altitude_score_correlation(records)?)?;
            } else {
                print_json(&metric_correlation(records, a, b)?)?;
            }
        }
        Commands::Report { output } => {
            let dataset = load_dataset(&config)?;
            let report = build_report(&dataset, &config)?;
            emit_json(&report, output.as_deref())?;
        }
    }

    Ok(())
}

/// Coloured stderr plus a JSON daily-rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/coffee_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("coffee_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Defaults, then the config file, then the environment, then global flags.
fn resolve_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    config.apply_env();
    if let Some(data) = &cli.data {
        config.data_path = Some(data.clone());
    }
    if let Some(outliers) = &cli.outliers {
        config.outliers_path = Some(outliers.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tracing::instrument(skip(config), fields(data = ?config.data_path, outliers = ?config.outliers_path))]
fn load_dataset(config: &ReportConfig) -> Result<Dataset> {
    let data = config
        .data_path
        .as_deref()
        .context("no dataset given: pass --data or set COFFEE_DATA_PATH")?;
    Dataset::load(Path::new(data), config.outliers_path.as_deref().map(Path::new))
}

/// Records as they were read, so written lists match the dataset exactly.
fn input_rows(records: &[CoffeeRecord]) -> Result<Vec<Cow<'_, Value>>> {
    Ok(records
        .iter()
        .map(Structural::structure)
        .collect::<coffee_stats::error::Result<_>>()?)
}

fn emit_json<T: Serialize + ?Sized>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_json(path, value),
        None => print_json(value),
    }
}

fn emit_table<T: Serialize>(rows: &[T], out: &TableOutput) -> Result<()> {
    match (out.format, out.output.as_deref()) {
        (Format::Json, output) => emit_json(rows, output),
        (Format::Csv, Some(path)) => write_csv(path, rows),
        (Format::Csv, None) => write_csv_to(std::io::stdout().lock(), rows),
    }
}

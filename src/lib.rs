pub mod analyzers;
pub mod config;
pub mod dataset;
pub mod error;
pub mod outliers;
pub mod output;
pub mod parser;
pub mod record;
pub mod stats;

pub use dataset::Dataset;
pub use error::StatsError;
pub use record::{CoffeeRecord, Metric, YearSelection};

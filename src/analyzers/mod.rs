//! Aggregation engines over the cleaned dataset.
//!
//! Each engine is a pure function from a record slice plus a small parameter
//! value to a flat table: yearly averages, country and owner rankings,
//! species/method comparison, dispersion summaries and correlations.
//! [`aggregate::build_report`] runs them all for one configuration.

pub mod aggregate;
pub mod correlation;
pub mod ranking;
pub mod summary;
pub mod types;
pub mod utility;
pub mod yearly;

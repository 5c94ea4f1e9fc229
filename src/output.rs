//! Output formatting and persistence for derived tables.
//!
//! Supports pretty-printing, JSON files or stdout, and CSV tables.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Writes `value` as pretty JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes `value` as pretty JSON to `path`, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

/// Writes `rows` to `out` as CSV with a header row.
pub fn write_csv_to<T: Serialize, W: Write>(out: W, rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `rows` as a CSV file at `path`, replacing any existing file.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV table");
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv_to(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::RankedOwner;
    use std::fs;

    fn owners() -> Vec<RankedOwner> {
        vec![
            RankedOwner {
                rank: 1,
                owner: "coop".into(),
                total_bags: 500,
                country: Some("Peru".into()),
            },
            RankedOwner {
                rank: 2,
                owner: "estate".into(),
                total_bags: 250,
                country: None,
            },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&owners());
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owners.csv");

        write_csv(&path, &owners()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "rank,owner,total_bags,country");
        assert_eq!(lines[1], "1,coop,500,Peru");
        assert_eq!(lines[2], "2,estate,250,");
    }

    #[test]
    fn test_write_csv_empty_table() {
        let mut buf = Vec::new();
        write_csv_to(&mut buf, &Vec::<RankedOwner>::new()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_json_round_trips_through_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owners.json");

        write_json(&path, &owners()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["owner"], "coop");
        assert_eq!(value[1]["country"], serde_json::Value::Null);
    }
}

//! Outlier removal.
//!
//! [`clean`] subtracts a curated outlier list from the raw dataset by full
//! structural equality. [`split_outliers`] is the generator for such a list:
//! it flags rows that are structurally incomplete or carry a numeric field
//! outside the interquartile fence.

use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::record::CoffeeRecord;

/// Default fence multiplier; stricter than the textbook 1.5.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 0.8;

/// Something [`clean`] can compare by full JSON structure.
pub trait Structural {
    /// The JSON value that identifies this item.
    fn structure(&self) -> Result<Cow<'_, Value>>;
}

impl Structural for Value {
    fn structure(&self) -> Result<Cow<'_, Value>> {
        Ok(Cow::Borrowed(self))
    }
}

/// A parsed record is identified by its input row, so two rows that only
/// coerce to the same values stay distinct. Records built in code fall back
/// to their serialized form.
impl Structural for CoffeeRecord {
    fn structure(&self) -> Result<Cow<'_, Value>> {
        match &self.source {
            Some(row) => Ok(Cow::Borrowed(row)),
            None => Ok(Cow::Owned(serde_json::to_value(self)?)),
        }
    }
}

/// Outcome of [`subtract_outliers`].
#[derive(Debug, Clone, PartialEq)]
pub struct Subtraction<T> {
    pub kept: Vec<T>,
    /// Distinct outlier entries that matched no raw row.
    pub unmatched: usize,
}

/// Removes every `raw` entry structurally equal to some entry of `outliers`.
///
/// Retained entries keep their relative order. Equality is by full content,
/// so two rows with identical content are removed together.
pub fn subtract_outliers<T: Structural + Clone>(raw: &[T], outliers: &[T]) -> Result<Subtraction<T>> {
    let mut excluded: HashMap<String, bool> = HashMap::with_capacity(outliers.len());
    for outlier in outliers {
        excluded.insert(canonical_form(outlier)?, false);
    }

    let mut kept = Vec::with_capacity(raw.len());
    for record in raw {
        match excluded.get_mut(&canonical_form(record)?) {
            Some(matched) => *matched = true,
            None => kept.push(record.clone()),
        }
    }
    let unmatched = excluded.values().filter(|matched| !**matched).count();

    debug!(
        raw = raw.len(),
        outliers = excluded.len(),
        kept = kept.len(),
        unmatched,
        "Outlier subtraction complete"
    );
    Ok(Subtraction { kept, unmatched })
}

/// [`subtract_outliers`], keeping only the retained rows.
pub fn clean<T: Structural + Clone>(raw: &[T], outliers: &[T]) -> Result<Vec<T>> {
    Ok(subtract_outliers(raw, outliers)?.kept)
}

/// Deterministic string form: object keys sorted at every depth, array order
/// preserved.
pub fn canonical_form<T: Structural + ?Sized>(item: &T) -> Result<String> {
    let value = item.structure()?;
    Ok(serde_json::to_string(&canonicalize(&value))?)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        // `10.0` and `10` are the same JSON number
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Interquartile-range detection
// ---------------------------------------------------------------------------

type Extract = fn(&CoffeeRecord) -> f64;

/// Numeric fields checked against the fence.
static NUMERIC_FIELDS: &[(&str, Extract)] = &[
    ("Location.Altitude.Min", |r| r.location.altitude.min),
    ("Location.Altitude.Max", |r| r.location.altitude.max),
    ("Location.Altitude.Average", |r| r.location.altitude.average),
    ("Year", |r| r.year.map_or(f64::NAN, f64::from)),
    ("Data.Production.Number of bags", |r| r.data.production.bags),
    ("Data.Production.Bag weight", |r| r.data.production.bag_weight),
    ("Data.Scores.Aroma", |r| r.data.scores.aroma),
    ("Data.Scores.Flavor", |r| r.data.scores.flavor),
    ("Data.Scores.Aftertaste", |r| r.data.scores.aftertaste),
    ("Data.Scores.Acidity", |r| r.data.scores.acidity),
    ("Data.Scores.Body", |r| r.data.scores.body),
    ("Data.Scores.Balance", |r| r.data.scores.balance),
    ("Data.Scores.Uniformity", |r| r.data.scores.uniformity),
    ("Data.Scores.Sweetness", |r| r.data.scores.sweetness),
    ("Data.Scores.Moisture", |r| r.data.scores.moisture),
    ("Data.Scores.Total", |r| r.data.scores.total),
];

/// Inclusive acceptance interval for one numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldBounds {
    pub field: &'static str,
    pub lower: f64,
    pub upper: f64,
}

impl FieldBounds {
    /// NaN values are never flagged.
    pub fn accepts(&self, value: f64) -> bool {
        value.is_nan() || (value >= self.lower && value <= self.upper)
    }
}

/// Computes `[Q1 - k*IQR, Q3 + k*IQR]` for every numeric field.
///
/// Quartiles are read at indices `floor(n * 0.25)` and `floor(n * 0.75)` of
/// the sorted finite values. A field with no finite values accepts anything.
pub fn field_bounds(records: &[CoffeeRecord], iqr_multiplier: f64) -> Result<Vec<FieldBounds>> {
    if !iqr_multiplier.is_finite() || iqr_multiplier < 0.0 {
        return Err(StatsError::InvalidArgument(format!(
            "IQR multiplier must be a non-negative number, got {iqr_multiplier}"
        )));
    }

    Ok(NUMERIC_FIELDS
        .iter()
        .map(|&(field, extract)| {
            let mut values: Vec<f64> = records
                .iter()
                .map(extract)
                .filter(|v| v.is_finite())
                .collect();
            if values.is_empty() {
                return FieldBounds {
                    field,
                    lower: f64::NEG_INFINITY,
                    upper: f64::INFINITY,
                };
            }
            values.sort_by(f64::total_cmp);

            let n = values.len();
            let q1 = values[n / 4];
            let q3 = values[n * 3 / 4];
            let iqr = q3 - q1;
            FieldBounds {
                field,
                lower: q1 - iqr_multiplier * iqr,
                upper: q3 + iqr_multiplier * iqr,
            }
        })
        .collect())
}

/// Input paths that must hold a non-null value. Color is not required.
static REQUIRED_PATHS: &[&str] = &[
    "/Location/Country",
    "/Location/Region",
    "/Location/Altitude/Min",
    "/Location/Altitude/Max",
    "/Location/Altitude/Average",
    "/Year",
    "/Data/Owner",
    "/Data/Type/Species",
    "/Data/Type/Variety",
    "/Data/Type/Processing method",
    "/Data/Production/Number of bags",
    "/Data/Production/Bag weight",
    "/Data/Scores/Aroma",
    "/Data/Scores/Flavor",
    "/Data/Scores/Aftertaste",
    "/Data/Scores/Acidity",
    "/Data/Scores/Body",
    "/Data/Scores/Balance",
    "/Data/Scores/Uniformity",
    "/Data/Scores/Sweetness",
    "/Data/Scores/Moisture",
    "/Data/Scores/Total",
];

/// Whether every identifying and numeric field is present.
///
/// For parsed rows presence is read from the input: `null` or a missing key
/// is incomplete, while an unreadable value such as `"nan"` still counts as
/// present (the fence check skips it). Records built in code have no input
/// row, so a `None` key or NaN number reads as absent.
pub fn has_complete_structure(record: &CoffeeRecord) -> bool {
    match &record.source {
        Some(row) => REQUIRED_PATHS
            .iter()
            .all(|path| row.pointer(path).is_some_and(|v| !v.is_null())),
        None => {
            let kind = &record.data.kind;
            record.location.country.is_some()
                && record.location.region.is_some()
                && record.data.owner.is_some()
                && kind.species.is_some()
                && kind.variety.is_some()
                && kind.processing_method.is_some()
                && NUMERIC_FIELDS
                    .iter()
                    .all(|&(_, extract)| !extract(record).is_nan())
        }
    }
}

//! The coffee-quality record as it appears in the dataset JSON.
//!
//! Decoding is forgiving: the source data mixes numbers with
//! numeric strings and `"nan"` placeholders, and some rows omit whole
//! sub-objects. Numbers that cannot be read become `f64::NAN`, keys that
//! cannot be read become `None`, and the aggregation engines skip them.
//! Rows decoded by [`crate::parser::parse_records`] also keep the input
//! object verbatim in [`CoffeeRecord::source`], which outlier matching and
//! the completeness check read instead of the coerced fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::StatsError;

/// One graded coffee lot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoffeeRecord {
    #[serde(rename = "Location", default, deserialize_with = "null_as_default")]
    pub location: Location,
    #[serde(rename = "Year", default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(rename = "Data", default, deserialize_with = "null_as_default")]
    pub data: CoffeeData,
    /// The input row as read, before any coercion.
    #[serde(skip)]
    pub source: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "Country", default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(rename = "Region", default, deserialize_with = "lenient_string")]
    pub region: Option<String>,
    #[serde(rename = "Altitude", default, deserialize_with = "null_as_default")]
    pub altitude: Altitude,
}

/// Altitude band in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Altitude {
    #[serde(rename = "Min", default = "missing", deserialize_with = "lenient_f64")]
    pub min: f64,
    #[serde(rename = "Max", default = "missing", deserialize_with = "lenient_f64")]
    pub max: f64,
    #[serde(rename = "Average", default = "missing", deserialize_with = "lenient_f64")]
    pub average: f64,
}

impl Default for Altitude {
    fn default() -> Self {
        Self {
            min: f64::NAN,
            max: f64::NAN,
            average: f64::NAN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoffeeData {
    #[serde(rename = "Owner", default, deserialize_with = "lenient_string")]
    pub owner: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "null_as_default")]
    pub kind: CoffeeType,
    #[serde(rename = "Production", default, deserialize_with = "null_as_default")]
    pub production: Production,
    #[serde(rename = "Scores", default, deserialize_with = "null_as_default")]
    pub scores: Scores,
    /// Cosmetic; never aggregated.
    #[serde(rename = "Color", default, deserialize_with = "lenient_string")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoffeeType {
    #[serde(rename = "Species", default, deserialize_with = "lenient_string")]
    pub species: Option<String>,
    #[serde(rename = "Variety", default, deserialize_with = "lenient_string")]
    pub variety: Option<String>,
    #[serde(rename = "Processing method", default, deserialize_with = "lenient_string")]
    pub processing_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    #[serde(rename = "Number of bags", default = "missing", deserialize_with = "lenient_f64")]
    pub bags: f64,
    #[serde(rename = "Bag weight", default = "missing", deserialize_with = "lenient_f64")]
    pub bag_weight: f64,
}

impl Default for Production {
    fn default() -> Self {
        Self {
            bags: f64::NAN,
            bag_weight: f64::NAN,
        }
    }
}

/// The nine sensory sub-scores plus the trusted total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(rename = "Aroma", default = "missing", deserialize_with = "lenient_f64")]
    pub aroma: f64,
    #[serde(rename = "Flavor", default = "missing", deserialize_with = "lenient_f64")]
    pub flavor: f64,
    #[serde(rename = "Aftertaste", default = "missing", deserialize_with = "lenient_f64")]
    pub aftertaste: f64,
    #[serde(rename = "Acidity", default = "missing", deserialize_with = "lenient_f64")]
    pub acidity: f64,
    #[serde(rename = "Body", default = "missing", deserialize_with = "lenient_f64")]
    pub body: f64,
    #[serde(rename = "Balance", default = "missing", deserialize_with = "lenient_f64")]
    pub balance: f64,
    #[serde(rename = "Uniformity", default = "missing", deserialize_with = "lenient_f64")]
    pub uniformity: f64,
    #[serde(rename = "Sweetness", default = "missing", deserialize_with = "lenient_f64")]
    pub sweetness: f64,
    #[serde(rename = "Moisture", default = "missing", deserialize_with = "lenient_f64")]
    pub moisture: f64,
    #[serde(rename = "Total", default = "missing", deserialize_with = "lenient_f64")]
    pub total: f64,
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            aroma: f64::NAN,
            flavor: f64::NAN,
            aftertaste: f64::NAN,
            acidity: f64::NAN,
            body: f64::NAN,
            balance: f64::NAN,
            uniformity: f64::NAN,
            sweetness: f64::NAN,
            moisture: f64::NAN,
            total: f64::NAN,
        }
    }
}

impl CoffeeRecord {
    pub fn country(&self) -> Option<&str> {
        self.location.country.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.location.region.as_deref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.data.owner.as_deref()
    }

    /// Species, or `None` when missing or empty.
    pub fn species(&self) -> Option<&str> {
        non_empty(self.data.kind.species.as_deref())
    }

    /// Processing method, or `None` when missing or empty.
    pub fn processing_method(&self) -> Option<&str> {
        non_empty(self.data.kind.processing_method.as_deref())
    }

    pub fn total(&self) -> f64 {
        self.data.scores.total
    }

    pub fn altitude_average(&self) -> f64 {
        self.location.altitude.average
    }

    /// Whole bags, rounded down. Missing, negative or NaN counts read as zero
    /// and values past `u64::MAX` saturate.
    pub fn bags(&self) -> u64 {
        let bags = self.data.production.bags;
        if bags.is_finite() && bags > 0.0 {
            bags.floor() as u64
        } else {
            0
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Metric selection
// ---------------------------------------------------------------------------

/// A rankable score: the total or one of the nine score categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Metric {
    #[default]
    Total,
    Aroma,
    Flavor,
    Aftertaste,
    Acidity,
    Body,
    Balance,
    Uniformity,
    Sweetness,
    Moisture,
}

impl Metric {
    /// The nine score categories, in dataset order.
    pub const CATEGORIES: [Metric; 9] = [
        Metric::Aroma,
        Metric::Flavor,
        Metric::Aftertaste,
        Metric::Acidity,
        Metric::Body,
        Metric::Balance,
        Metric::Uniformity,
        Metric::Sweetness,
        Metric::Moisture,
    ];

    /// `Total` followed by the nine categories.
    pub const ALL: [Metric; 10] = [
        Metric::Total,
        Metric::Aroma,
        Metric::Flavor,
        Metric::Aftertaste,
        Metric::Acidity,
        Metric::Body,
        Metric::Balance,
        Metric::Uniformity,
        Metric::Sweetness,
        Metric::Moisture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Total => "Total",
            Metric::Aroma => "Aroma",
            Metric::Flavor => "Flavor",
            Metric::Aftertaste => "Aftertaste",
            Metric::Acidity => "Acidity",
            Metric::Body => "Body",
            Metric::Balance => "Balance",
            Metric::Uniformity => "Uniformity",
            Metric::Sweetness => "Sweetness",
            Metric::Moisture => "Moisture",
        }
    }

    /// Typed accessor for this metric.
    pub fn accessor(self) -> fn(&Scores) -> f64 {
        match self {
            Metric::Total => |s| s.total,
            Metric::Aroma => |s| s.aroma,
            Metric::Flavor => |s| s.flavor,
            Metric::Aftertaste => |s| s.aftertaste,
            Metric::Acidity => |s| s.acidity,
            Metric::Body => |s| s.body,
            Metric::Balance => |s| s.balance,
            Metric::Uniformity => |s| s.uniformity,
            Metric::Sweetness => |s| s.sweetness,
            Metric::Moisture => |s| s.moisture,
        }
    }

    pub fn value(self, record: &CoffeeRecord) -> f64 {
        (self.accessor())(&record.data.scores)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StatsError::UnknownMetric(s.to_string()))
    }
}

impl TryFrom<String> for Metric {
    type Error = StatsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Year restriction for the country ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearSelection {
    #[default]
    All,
    Year(i32),
}

impl YearSelection {
    pub fn matches(self, year: Option<i32>) -> bool {
        match self {
            YearSelection::All => true,
            YearSelection::Year(wanted) => year == Some(wanted),
        }
    }
}

impl From<Option<i32>> for YearSelection {
    fn from(year: Option<i32>) -> Self {
        year.map_or(YearSelection::All, YearSelection::Year)
    }
}

impl fmt::Display for YearSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearSelection::All => f.write_str("all"),
            YearSelection::Year(y) => write!(f, "{y}"),
        }
    }
}

impl Serialize for YearSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            YearSelection::All => serializer.serialize_str("all"),
            YearSelection::Year(y) => serializer.serialize_i32(*y),
        }
    }
}

impl FromStr for YearSelection {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(YearSelection::All);
        }
        s.parse::<i32>()
            .map(YearSelection::Year)
            .map_err(|_| StatsError::InvalidArgument(format!("year must be 'all' or an integer, got '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

fn missing() -> f64 {
    f64::NAN
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(f64::NAN, number_from_json))
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(year_from_json))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Reads a JSON number or numeric string; everything else is NaN.
pub(crate) fn number_from_json(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn year_from_json(value: &Value) -> Option<i32> {
    let year = number_from_json(value);
    if year.is_finite() && year.fract() == 0.0 && year.abs() <= f64::from(i32::MAX) {
        Some(year as i32)
    } else {
        None
    }
}

//! Statistical primitives.
//!
//! Every function silently drops non-finite inputs before computing, and
//! returns a fallback (0.0, or `None` for [`mode`]) when nothing is left.
//! Paired functions drop a pair when either side is non-finite.

use indexmap::IndexMap;

use crate::error::{Result, StatsError};

/// Projects `items` to numbers, keeping only finite results.
pub fn project<T>(items: &[T], f: impl Fn(&T) -> f64) -> Vec<f64> {
    items.iter().map(f).filter(|v| v.is_finite()).collect()
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Arithmetic mean. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    let values = finite(values);
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divisor n).
pub fn variance(values: &[f64]) -> f64 {
    let values = finite(values);
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(&values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Sample variance (divisor n - 1). Returns 0.0 below two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let values = finite(values);
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(&values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Population standard deviation.
pub fn standard_deviation(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// `stddev / mean * 100`; 0.0 when the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    standard_deviation(values) / m * 100.0
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted = finite(values);
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Most frequent value; ties go to the value seen first.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut counts: IndexMap<u64, (f64, usize)> = IndexMap::new();
    for v in finite(values) {
        // -0.0 and 0.0 are the same value
        let v = if v == 0.0 { 0.0 } else { v };
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }

    let mut best: Option<(f64, usize)> = None;
    for &(value, count) in counts.values() {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

pub fn min(values: &[f64]) -> f64 {
    finite(values).into_iter().reduce(f64::min).unwrap_or(0.0)
}

pub fn max(values: &[f64]) -> f64 {
    finite(values).into_iter().reduce(f64::max).unwrap_or(0.0)
}

fn finite_pairs(xs: &[f64], ys: &[f64]) -> Result<Vec<(f64, f64)>> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    Ok(xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect())
}

/// Population covariance: mean of products of paired deviations.
pub fn covariance(xs: &[f64], ys: &[f64]) -> Result<f64> {
    let pairs = finite_pairs(xs, ys)?;
    if pairs.is_empty() {
        return Ok(0.0);
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    Ok(pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum::<f64>() / n)
}

/// Pearson correlation coefficient over paired series.
///
/// Returns 0.0 with fewer than two pairs or when either series is constant.
pub fn sample_correlation(xs: &[f64], ys: &[f64]) -> Result<f64> {
    let pairs = finite_pairs(xs, ys)?;
    if pairs.len() < 2 {
        return Ok(0.0);
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }
    Ok(sxy / denominator)
}

/// Rounds half away from zero at `precision` decimals.
///
/// Non-finite input rounds to 0.0.
///
/// # Errors
///
/// Returns [`StatsError::InvalidArgument`] for a negative precision.
pub fn round(value: f64, precision: i32) -> Result<f64> {
    let precision = u32::try_from(precision).map_err(|_| {
        StatsError::InvalidArgument(format!("precision must be non-negative, got {precision}"))
    })?;
    Ok(round_to(value, precision))
}

/// Infallible form of [`round`].
///
/// Shifts through the decimal representation so that values like 1.005
/// round up as written rather than as stored.
pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(precision as i32);
    let shifted: f64 = format!("{value}e{precision}")
        .parse()
        .unwrap_or(value * factor);
    let rounded = shifted.round();
    let result = format!("{rounded}e-{precision}")
        .parse()
        .unwrap_or(rounded / factor);
    if result.is_finite() { result } else { 0.0 }
}

/// Two-decimal rounding used for every display figure.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// "SANTA ANA" -> "Santa Ana".
pub fn title_case(s: &str) -> String {
    s.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

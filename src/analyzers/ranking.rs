//! Top-10 rankings: countries by a score metric, owners by bag volume.

use indexmap::IndexMap;
use tracing::debug;

use crate::analyzers::types::{CountryRanking, CountryRankingParams, RankedCountry, RankedOwner};
use crate::analyzers::yearly::FieldSum;
use crate::record::{CoffeeRecord, YearSelection};

/// Length of every ranking table.
pub const TOP_N: usize = 10;

#[derive(Default)]
struct CountryAccumulator {
    records: usize,
    metric: FieldSum,
}

/// Ranks countries by their mean of `params.metric`.
///
/// With [`YearSelection::All`], countries with fewer than
/// `params.min_sample_size` records are dropped. With a single year the
/// threshold is not applied at all. Ties keep first-seen order; ranks are
/// positional, 1 through at most [`TOP_N`].
pub fn rank_countries(records: &[CoffeeRecord], params: &CountryRankingParams) -> CountryRanking {
    let mut groups: IndexMap<&str, CountryAccumulator> = IndexMap::new();
    let mut skipped = 0usize;

    for record in records {
        if !params.year.matches(record.year) {
            continue;
        }
        let Some(country) = record.country() else {
            skipped += 1;
            continue;
        };
        let acc = groups.entry(country).or_default();
        acc.records += 1;
        acc.metric.add(params.metric.value(record));
    }

    let survivors: Vec<(&str, CountryAccumulator)> = groups
        .into_iter()
        .filter(|(_, acc)| match params.year {
            YearSelection::All => acc.records >= params.min_sample_size,
            YearSelection::Year(_) => true,
        })
        .collect();

    let qualifying_countries = survivors.len();
    let qualifying_records = survivors.iter().map(|(_, acc)| acc.records).sum();

    let mut countries: Vec<RankedCountry> = survivors
        .into_iter()
        .map(|(country, acc)| RankedCountry {
            rank: 0,
            country: country.to_string(),
            sample_size: acc.records,
            value: acc.metric.mean(),
        })
        .collect();
    countries.sort_by(|a, b| b.value.total_cmp(&a.value));
    countries.truncate(TOP_N);
    for (i, entry) in countries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    debug!(
        metric = %params.metric,
        year = %params.year,
        qualifying_countries,
        qualifying_records,
        skipped,
        "Country ranking computed"
    );

    CountryRanking {
        metric: params.metric,
        year: params.year,
        qualifying_countries,
        qualifying_records,
        countries,
    }
}

/// Ranks owners by total bags across all their records.
///
/// Owners are grouped by name only, so an owner with lots in several
/// countries reports the country of its last record.
pub fn rank_owners_by_volume(records: &[CoffeeRecord]) -> Vec<RankedOwner> {
    let mut owners: IndexMap<&str, (u64, Option<&str>)> = IndexMap::new();

    for record in records {
        let Some(owner) = record.owner() else {
            continue;
        };
        let entry = owners.entry(owner).or_default();
        entry.0 = entry.0.saturating_add(record.bags());
        if let Some(country) = record.country() {
            entry.1 = Some(country);
        }
    }

    debug!(owners = owners.len(), "Owner volumes summed");

    let mut ranked: Vec<RankedOwner> = owners
        .into_iter()
        .map(|(owner, (total_bags, country))| RankedOwner {
            rank: 0,
            owner: owner.to_string(),
            total_bags,
            country: country.map(str::to_string),
        })
        .collect();
    ranked.sort_by(|a, b| b.total_bags.cmp(&a.total_bags));
    ranked.truncate(TOP_N);
    for (i, entry) in ranked.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    ranked
}

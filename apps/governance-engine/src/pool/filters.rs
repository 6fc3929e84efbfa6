//! Structural filter pipeline.
//!
//! Filters run in a fixed order so two builds over the same inputs walk the
//! same path: volume floor, market-cap floor, price bounds, sector
//! exclusion, ownership exclusion, yield exclusion.

use crate::config::{StructuralFilters, UniverseEntry};
use crate::models::{PoolDecision, PoolDecisionKind};

/// Filter names as they appear in decision trails and audit entries.
pub const FILTER_ORDER: [&str; 6] = [
    "volume_floor",
    "market_cap_floor",
    "price_bounds",
    "sector_exclusion",
    "ownership_exclusion",
    "yield_exclusion",
];

/// Reason a filter excludes an entry, or `None` to keep it.
fn exclusion_reason(
    filter: &str,
    entry: &UniverseEntry,
    config: &StructuralFilters,
) -> Option<String> {
    match filter {
        "volume_floor" => (entry.avg_daily_volume < config.min_avg_daily_volume).then(|| {
            format!(
                "avg daily volume {:.0} below floor {:.0}",
                entry.avg_daily_volume, config.min_avg_daily_volume
            )
        }),
        "market_cap_floor" => (entry.market_cap < config.min_market_cap).then(|| {
            format!(
                "market cap {:.0} below floor {:.0}",
                entry.market_cap, config.min_market_cap
            )
        }),
        "price_bounds" => (entry.price < config.min_price || entry.price > config.max_price)
            .then(|| {
                format!(
                    "price {:.2} outside [{:.2}, {:.2}]",
                    entry.price, config.min_price, config.max_price
                )
            }),
        "sector_exclusion" => config
            .excluded_sectors
            .iter()
            .any(|s| s == &entry.sector)
            .then(|| format!("sector '{}' is excluded", entry.sector)),
        "ownership_exclusion" => (entry.insider_ownership_pct
            > config.max_insider_ownership_pct)
            .then(|| {
                format!(
                    "insider ownership {:.2} above cap {:.2}",
                    entry.insider_ownership_pct, config.max_insider_ownership_pct
                )
            }),
        "yield_exclusion" => (entry.dividend_yield > config.max_dividend_yield).then(|| {
            format!(
                "dividend yield {:.2} above cap {:.2}",
                entry.dividend_yield, config.max_dividend_yield
            )
        }),
        _ => None,
    }
}

/// Apply the structural filters to a sorted universe slice.
///
/// Returns the surviving entries in input order; every exclusion is recorded
/// in `decisions` with the filter's name as the source.
pub(crate) fn apply_structural_filters<'a>(
    universe: &[&'a UniverseEntry],
    config: &StructuralFilters,
    decisions: &mut Vec<PoolDecision>,
) -> Vec<&'a UniverseEntry> {
    let mut survivors: Vec<&UniverseEntry> = universe.to_vec();

    for filter in FILTER_ORDER {
        survivors.retain(|entry| match exclusion_reason(filter, entry, config) {
            Some(reason) => {
                decisions.push(PoolDecision {
                    symbol: entry.symbol.clone(),
                    kind: PoolDecisionKind::Excluded,
                    reason,
                    source: filter.to_string(),
                });
                false
            }
            None => true,
        });
    }

    survivors
}

//! Base universe and structural filter configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::Symbol;

use super::ConfigError;

/// One base-universe member with the reference data the structural filters
/// evaluate against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseEntry {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Sector classification.
    pub sector: String,
    /// Average daily dollar volume.
    pub avg_daily_volume: f64,
    /// Market capitalization.
    pub market_cap: f64,
    /// Last reference price.
    pub price: f64,
    /// Trailing dividend yield as a fraction.
    #[serde(default)]
    pub dividend_yield: f64,
    /// Insider ownership as a fraction.
    #[serde(default)]
    pub insider_ownership_pct: f64,
}

/// Structural filter configuration applied to the base universe.
///
/// Filters run in a fixed, documented order: volume floor, market-cap
/// floor, price bounds, sector exclusion, ownership exclusion, yield
/// exclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralFilters {
    /// Minimum average daily dollar volume.
    #[serde(default = "default_min_avg_daily_volume")]
    pub min_avg_daily_volume: f64,
    /// Minimum market capitalization.
    #[serde(default = "default_min_market_cap")]
    pub min_market_cap: f64,
    /// Minimum price.
    #[serde(default = "default_min_price")]
    pub min_price: f64,
    /// Maximum price.
    #[serde(default = "default_max_price")]
    pub max_price: f64,
    /// Excluded sectors.
    #[serde(default)]
    pub excluded_sectors: Vec<String>,
    /// Maximum insider ownership fraction.
    #[serde(default = "default_max_insider_ownership_pct")]
    pub max_insider_ownership_pct: f64,
    /// Maximum dividend yield fraction (yield-trap exclusion).
    #[serde(default = "default_max_dividend_yield")]
    pub max_dividend_yield: f64,
}

impl Default for StructuralFilters {
    fn default() -> Self {
        Self {
            min_avg_daily_volume: default_min_avg_daily_volume(),
            min_market_cap: default_min_market_cap(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            excluded_sectors: Vec::new(),
            max_insider_ownership_pct: default_max_insider_ownership_pct(),
            max_dividend_yield: default_max_dividend_yield(),
        }
    }
}

const fn default_min_avg_daily_volume() -> f64 {
    1_000_000.0
}

const fn default_min_market_cap() -> f64 {
    500_000_000.0
}

const fn default_min_price() -> f64 {
    5.0
}

const fn default_max_price() -> f64 {
    10_000.0
}

const fn default_max_insider_ownership_pct() -> f64 {
    1.0
}

const fn default_max_dividend_yield() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct UniverseDoc {
    universe: Vec<UniverseEntry>,
    #[serde(default)]
    filters: StructuralFilters,
}

/// Parse and validate the universe document.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors or on any field-level violation.
pub fn parse_universe(
    file: &str,
    yaml: &str,
) -> Result<(Vec<UniverseEntry>, StructuralFilters), ConfigError> {
    let doc: UniverseDoc = serde_yaml_bw::from_str(yaml).map_err(|e| ConfigError::ParseError {
        file: file.to_string(),
        source: e,
    })?;

    if doc.universe.is_empty() {
        return Err(
            ValidationError::new(file, "universe", "base universe must not be empty").into(),
        );
    }

    let mut seen = std::collections::BTreeSet::new();
    for entry in &doc.universe {
        let prefix = format!("universe.{}", entry.symbol);
        if !seen.insert(entry.symbol.clone()) {
            return Err(ValidationError::new(
                file,
                format!("{prefix}.symbol"),
                "duplicate universe symbol",
            )
            .into());
        }
        for (field, value) in [
            ("avg_daily_volume", entry.avg_daily_volume),
            ("market_cap", entry.market_cap),
            ("price", entry.price),
            ("dividend_yield", entry.dividend_yield),
            ("insider_ownership_pct", entry.insider_ownership_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::new(
                    file,
                    format!("{prefix}.{field}"),
                    "value must be a finite non-negative number",
                )
                .into());
            }
        }
        if entry.price == 0.0 {
            return Err(ValidationError::new(
                file,
                format!("{prefix}.price"),
                "price must be positive",
            )
            .into());
        }
    }

    let filters = &doc.filters;
    if filters.min_price >= filters.max_price {
        return Err(ValidationError::new(
            file,
            "filters.min_price",
            "min_price must be below max_price",
        )
        .into());
    }
    for (field, value) in [
        ("min_avg_daily_volume", filters.min_avg_daily_volume),
        ("min_market_cap", filters.min_market_cap),
        ("min_price", filters.min_price),
        ("max_price", filters.max_price),
        ("max_insider_ownership_pct", filters.max_insider_ownership_pct),
        ("max_dividend_yield", filters.max_dividend_yield),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::new(
                file,
                format!("filters.{field}"),
                "value must be a finite non-negative number",
            )
            .into());
        }
    }

    Ok((doc.universe, doc.filters))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = concat!(
        "universe:\n",
        "  - symbol: MU\n",
        "    sector: Semiconductors\n",
        "    avg_daily_volume: 24000000\n",
        "    market_cap: 105000000000\n",
        "    price: 95.0\n",
        "  - symbol: AMD\n",
        "    sector: Semiconductors\n",
        "    avg_daily_volume: 51000000\n",
        "    market_cap: 225000000000\n",
        "    price: 140.0\n",
        "filters:\n",
        "  min_avg_daily_volume: 5000000\n",
        "  min_market_cap: 2000000000\n",
        "  min_price: 5.0\n",
        "  max_price: 2000.0\n",
        "  excluded_sectors: [Tobacco]\n",
    );

    #[test]
    fn parses_valid_document() {
        let (universe, filters) = parse_universe("universe.yaml", VALID).unwrap();
        assert_eq!(universe.len(), 2);
        assert_eq!(filters.excluded_sectors, vec!["Tobacco".to_string()]);
        assert_eq!(filters.max_dividend_yield, 1.0);
    }

    #[test]
    fn rejects_empty_universe() {
        let err = parse_universe("universe.yaml", "universe: []\n").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let yaml = concat!(
            "universe:\n",
            "  - symbol: MU\n",
            "    sector: Semiconductors\n",
            "    avg_daily_volume: 1\n",
            "    market_cap: 1\n",
            "    price: 1.0\n",
            "  - symbol: MU\n",
            "    sector: Semiconductors\n",
            "    avg_daily_volume: 1\n",
            "    market_cap: 1\n",
            "    price: 1.0\n",
        );
        let err = parse_universe("universe.yaml", yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_inverted_price_bounds() {
        let yaml = concat!(
            "universe:\n",
            "  - symbol: MU\n",
            "    sector: Semiconductors\n",
            "    avg_daily_volume: 1\n",
            "    market_cap: 1\n",
            "    price: 1.0\n",
            "filters:\n",
            "  min_price: 100.0\n",
            "  max_price: 10.0\n",
        );
        let err = parse_universe("universe.yaml", yaml).unwrap_err();
        assert!(err.to_string().contains("min_price"));
    }
}

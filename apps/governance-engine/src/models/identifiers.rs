//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(HypothesisId, "Unique identifier for a market hypothesis.");
define_id!(ConstraintId, "Unique identifier for a governance constraint.");
define_id!(FactorId, "Unique identifier for a registered factor.");
define_id!(StrategyId, "Identifier for a trading strategy.");
define_id!(
    TraceId,
    "Trace identifier linking audit entries to a trading decision."
);

/// A ticker symbol, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new symbol, normalizing to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_normalizes_to_uppercase() {
        let symbol = Symbol::new(" nvda ");
        assert_eq!(symbol.as_str(), "NVDA");
    }

    #[test]
    fn ids_are_distinct_types() {
        let hypothesis = HypothesisId::new("H-001");
        let constraint = ConstraintId::new("H-001");
        assert_eq!(hypothesis.as_str(), constraint.as_str());
    }

    #[test]
    fn id_display_roundtrip() {
        let id = HypothesisId::new("H-SEMI-CAPEX");
        assert_eq!(id.to_string(), "H-SEMI-CAPEX");
        assert_eq!(HypothesisId::from(id.to_string()), id);
    }

    #[test]
    fn symbol_serde_transparent() {
        let symbol = Symbol::new("MU");
        let json = serde_json::to_string(&symbol).unwrap();
        assert_eq!(json, "\"MU\"");
    }
}

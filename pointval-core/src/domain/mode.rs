use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How points are priced: as travel redemptions or as cash-equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMode {
    #[default]
    Travel,
    Cash,
}

impl ValuationMode {
    pub const ALL: [ValuationMode; 2] = [ValuationMode::Travel, ValuationMode::Cash];

    /// The other mode (the travel/cash switch button).
    pub fn toggle(self) -> ValuationMode {
        match self {
            ValuationMode::Travel => ValuationMode::Cash,
            ValuationMode::Cash => ValuationMode::Travel,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValuationMode::Travel => "travel",
            ValuationMode::Cash => "cash",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValuationMode::Travel => "Travel value",
            ValuationMode::Cash => "Cash value",
        }
    }
}

impl fmt::Display for ValuationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown valuation mode '{0}' (expected travel or cash)")]
pub struct ParseModeError(pub String);

impl FromStr for ValuationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "travel" => Ok(ValuationMode::Travel),
            "cash" => Ok(ValuationMode::Cash),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

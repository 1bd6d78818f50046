use serde::{Deserialize, Serialize};

use super::ids::ProgramId;
use super::mode::ValuationMode;

/// Dollars-per-point conversion rates, one per valuation mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub travel: f64,
    pub cash: f64,
}

impl Rates {
    pub fn new(travel: f64, cash: f64) -> Self {
        Self { travel, cash }
    }

    pub fn for_mode(&self, mode: ValuationMode) -> f64 {
        match mode {
            ValuationMode::Travel => self.travel,
            ValuationMode::Cash => self.cash,
        }
    }
}

/// A loyalty program as listed in the catalog. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    /// Opaque reference handed to the presentation layer (path, URL, sprite key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub rate: Rates,
    /// Shown in the "popular programs" row.
    #[serde(default)]
    pub popular: bool,
}

impl Program {
    pub fn new(id: impl Into<ProgramId>, name: impl Into<String>, rate: Rates) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
            rate,
            popular: false,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn popular(mut self) -> Self {
        self.popular = true;
        self
    }

    pub fn rate_for(&self, mode: ValuationMode) -> f64 {
        self.rate.for_mode(mode)
    }
}

//! Valuation engine: turns point balances into money.
//!
//! Values are `points * rate` in `f64`, summed unrounded in selection order.
//! Rounding to cents happens only at the presentation boundary
//! ([`round_to_cents`], [`format_money`]). Totals are never cached: every
//! call recomputes from the selections it is given.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::catalog::ProgramCatalog;
use crate::domain::{ProgramId, ValuationMode};
use crate::selection::Selection;

/// Errors from valuation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    #[error("selection references unknown program '{0}'")]
    UnknownProgram(ProgramId),
}

/// Aggregate over all selections.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub total_points: u64,
    pub total_value: f64,
}

/// Valuation of a single selection under one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueLine {
    pub program_id: ProgramId,
    pub name: String,
    pub points: u64,
    pub rate: f64,
    pub value: f64,
}

/// Per-program lines plus their totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub mode: ValuationMode,
    pub lines: Vec<ValueLine>,
    pub totals: Totals,
}

/// Monetary value of a balance at a rate.
pub fn line_value(points: u64, rate: f64) -> f64 {
    points as f64 * rate
}

/// Left-to-right sum. Every aggregate in the workspace goes through this so
/// independently computed sums over the same values agree bit for bit.
pub fn sum_values<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().fold(0.0, |acc, v| acc + v)
}

/// Values selections against the catalog under the current mode.
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    catalog: Arc<ProgramCatalog>,
    mode: ValuationMode,
}

impl ValuationEngine {
    pub fn new(catalog: Arc<ProgramCatalog>) -> Self {
        Self::with_mode(catalog, ValuationMode::default())
    }

    pub fn with_mode(catalog: Arc<ProgramCatalog>, mode: ValuationMode) -> Self {
        Self { catalog, mode }
    }

    pub fn mode(&self) -> ValuationMode {
        self.mode
    }

    /// Set the current mode. Returns whether it changed; requesting the
    /// current mode again is a no-op.
    pub fn switch_mode(&mut self, mode: ValuationMode) -> bool {
        if self.mode == mode {
            return false;
        }
        debug!(from = %self.mode, to = %mode, "valuation mode switched");
        self.mode = mode;
        true
    }

    /// Flip between travel and cash, returning the new mode.
    pub fn toggle_mode(&mut self) -> ValuationMode {
        self.switch_mode(self.mode.toggle());
        self.mode
    }

    /// Per-program lines and totals under an explicit mode.
    pub fn valuate_in(
        &self,
        selections: &[Selection],
        mode: ValuationMode,
    ) -> Result<Valuation, ValuationError> {
        let lines = selections
            .iter()
            .map(|selection| {
                let program = self
                    .catalog
                    .get(selection.program_id.as_str())
                    .ok_or_else(|| ValuationError::UnknownProgram(selection.program_id.clone()))?;
                let rate = program.rate_for(mode);
                Ok(ValueLine {
                    program_id: selection.program_id.clone(),
                    name: program.name.clone(),
                    points: selection.points,
                    rate,
                    value: line_value(selection.points, rate),
                })
            })
            .collect::<Result<Vec<_>, ValuationError>>()?;

        let totals = totals_of(&lines);
        Ok(Valuation { mode, lines, totals })
    }

    /// Per-program lines and totals under the current mode.
    pub fn valuate(&self, selections: &[Selection]) -> Result<Valuation, ValuationError> {
        self.valuate_in(selections, self.mode)
    }

    /// Totals under an explicit mode.
    pub fn compute_totals(
        &self,
        selections: &[Selection],
        mode: ValuationMode,
    ) -> Result<Totals, ValuationError> {
        self.valuate_in(selections, mode).map(|v| v.totals)
    }

    /// Totals under the current mode.
    pub fn current_totals(&self, selections: &[Selection]) -> Result<Totals, ValuationError> {
        self.compute_totals(selections, self.mode)
    }

    pub fn catalog(&self) -> &Arc<ProgramCatalog> {
        &self.catalog
    }
}

fn totals_of(lines: &[ValueLine]) -> Totals {
    Totals {
        total_points: lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.points)),
        total_value: sum_values(lines.iter().map(|line| line.value)),
    }
}

/// Round half away from zero to two decimal places.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render an amount for display: rounded to cents, thousands separated,
/// with a symbol for common currencies and the ISO code otherwise.
pub fn format_money(value: f64, currency: &str) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let amount = format!("{}.{:02}", whole, cents % 100);
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };

    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{amount} {currency}"),
    }
}

/// Group digits in threes: `1234567` → `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

//! Report composer: projects selections and totals into chart and email data.
//!
//! Chart values are the same per-program values the valuation engine sums,
//! so bar values always add back up to `totals.total_value`. The composer
//! still checks that sum against the totals it was handed and refuses stale
//! totals with `ReportError::TotalsMismatch`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use pointval_core::{
    sum_values, CatalogFingerprint, ProgramCatalog, ProgramId, ReportInputs, Selection, Totals,
    ValuationEngine, ValuationError, ValuationMode, ValueLine,
};

/// Current schema version for serialized reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Relative tolerance when checking chart sums against totals.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// Errors from report composition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("cannot compose a report with no selected programs")]
    EmptySelection,

    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error("chart values sum to {chart} but totals report {totals}")]
    TotalsMismatch { chart: f64, totals: f64 },

    #[error("report lines hold {lines} points but totals report {totals}")]
    PointsMismatch { lines: u64, totals: u64 },
}

/// One bar: program label and monetary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// One pie slice: value plus its fraction of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub share: f64,
}

/// Everything the results step, the chart renderer and the email modal need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub currency: String,
    pub mode: ValuationMode,
    pub catalog_fingerprint: CatalogFingerprint,
    pub lines: Vec<ValueLine>,
    pub totals: Totals,
    pub bar_chart: Vec<ChartPoint>,
    pub pie_chart: Vec<PieSlice>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ReportPayload {
    /// Sum of bar values, in line order.
    pub fn chart_total(&self) -> f64 {
        sum_values(self.bar_chart.iter().map(|p| p.value))
    }

    /// Check that chart data adds up to `totals` within [`SUM_TOLERANCE`].
    pub fn verify_against(&self, totals: &Totals) -> Result<(), ReportError> {
        let lines: u64 = self
            .lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.points));
        if lines != totals.total_points {
            return Err(ReportError::PointsMismatch {
                lines,
                totals: totals.total_points,
            });
        }

        let chart = self.chart_total();
        if !within_tolerance(chart, totals.total_value) {
            return Err(ReportError::TotalsMismatch {
                chart,
                totals: totals.total_value,
            });
        }
        Ok(())
    }

    /// Programs in the report, in selection order.
    pub fn program_ids(&self) -> Vec<&ProgramId> {
        self.lines.iter().map(|l| &l.program_id).collect()
    }
}

fn within_tolerance(a: f64, b: f64) -> bool {
    (a - b).abs() <= SUM_TOLERANCE * a.abs().max(b.abs())
}

/// Stateless projection over catalog + selections + totals.
#[derive(Debug, Clone)]
pub struct ReportComposer {
    catalog: Arc<ProgramCatalog>,
}

impl ReportComposer {
    pub fn new(catalog: Arc<ProgramCatalog>) -> Self {
        Self { catalog }
    }

    /// Compose a report stamped with the current time.
    pub fn compose(
        &self,
        selections: &[Selection],
        totals: &Totals,
        mode: ValuationMode,
    ) -> Result<ReportPayload, ReportError> {
        self.compose_at(selections, totals, mode, Utc::now())
    }

    /// Compose a report with an explicit timestamp.
    pub fn compose_at(
        &self,
        selections: &[Selection],
        totals: &Totals,
        mode: ValuationMode,
        generated_at: DateTime<Utc>,
    ) -> Result<ReportPayload, ReportError> {
        if selections.is_empty() {
            return Err(ReportError::EmptySelection);
        }

        let engine = ValuationEngine::with_mode(Arc::clone(&self.catalog), mode);
        let valuation = engine.valuate(selections)?;

        let bar_chart: Vec<ChartPoint> = valuation
            .lines
            .iter()
            .map(|line| ChartPoint {
                label: line.name.clone(),
                value: line.value,
            })
            .collect();

        let pie_chart = valuation
            .lines
            .iter()
            .map(|line| PieSlice {
                label: line.name.clone(),
                value: line.value,
                share: if totals.total_value > 0.0 {
                    line.value / totals.total_value
                } else {
                    0.0
                },
            })
            .collect();

        let payload = ReportPayload {
            schema_version: SCHEMA_VERSION,
            report_id: report_id(self.catalog.fingerprint(), mode, selections),
            generated_at,
            currency: self.catalog.currency().to_string(),
            mode,
            catalog_fingerprint: self.catalog.fingerprint().clone(),
            lines: valuation.lines,
            totals: *totals,
            bar_chart,
            pie_chart,
        };
        payload.verify_against(totals)?;

        debug!(
            report_id = %payload.report_id,
            programs = payload.lines.len(),
            total_value = totals.total_value,
            %mode,
            "report composed"
        );
        Ok(payload)
    }

    /// Compose from a session's captured inputs.
    pub fn compose_inputs(inputs: &ReportInputs) -> Result<ReportPayload, ReportError> {
        ReportComposer::new(Arc::clone(&inputs.catalog)).compose(
            &inputs.selections,
            &inputs.totals,
            inputs.mode,
        )
    }
}

/// Deterministic id: identical catalog, mode and balances give the same id.
pub fn report_id(
    fingerprint: &CatalogFingerprint,
    mode: ValuationMode,
    selections: &[Selection],
) -> String {
    let entries: Vec<_> = selections
        .iter()
        .map(|s| json!({ "program_id": s.program_id.as_str(), "points": s.points }))
        .collect();
    let canonical = json!({
        "catalog": fingerprint.0,
        "mode": mode.as_str(),
        "selections": entries,
    });
    blake3::hash(canonical.to_string().as_bytes())
        .to_hex()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pointval_core::{Program, Rates};

    fn catalog() -> Arc<ProgramCatalog> {
        Arc::new(
            ProgramCatalog::new(
                "USD",
                vec![
                    Program::new("a", "Alpha", Rates::new(0.01, 0.005)),
                    Program::new("b", "Beta", Rates::new(0.012, 0.006)),
                ],
            )
            .unwrap(),
        )
    }

    fn selection(id: &str, points: u64) -> Selection {
        Selection {
            program_id: ProgramId::new(id),
            points,
            touched: true,
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn totals_for(selections: &[Selection], mode: ValuationMode) -> Totals {
        ValuationEngine::new(catalog())
            .compute_totals(selections, mode)
            .unwrap()
    }

    #[test]
    fn test_bar_chart_sums_to_totals() {
        let selections = vec![selection("a", 1000), selection("b", 500)];
        let totals = totals_for(&selections, ValuationMode::Travel);
        let payload = ReportComposer::new(catalog())
            .compose_at(&selections, &totals, ValuationMode::Travel, fixed_time())
            .unwrap();

        assert_eq!(payload.bar_chart.len(), 2);
        assert_eq!(payload.bar_chart[0].label, "Alpha");
        assert_eq!(payload.chart_total(), totals.total_value);
    }

    #[test]
    fn test_pie_shares_sum_to_one() {
        let selections = vec![selection("a", 1000), selection("b", 500)];
        let totals = totals_for(&selections, ValuationMode::Travel);
        let payload = ReportComposer::new(catalog())
            .compose(&selections, &totals, ValuationMode::Travel)
            .unwrap();

        let shares: f64 = payload.pie_chart.iter().map(|s| s.share).sum();
        assert!((shares - 1.0).abs() < 1e-12);
        assert!((payload.pie_chart[0].share - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let result = ReportComposer::new(catalog()).compose(
            &[],
            &Totals::default(),
            ValuationMode::Travel,
        );
        assert_eq!(result, Err(ReportError::EmptySelection));
    }

    #[test]
    fn test_stale_totals_rejected() {
        let selections = vec![selection("a", 1000)];
        let stale = Totals {
            total_points: 1000,
            total_value: 99.0,
        };
        let result =
            ReportComposer::new(catalog()).compose(&selections, &stale, ValuationMode::Travel);
        assert!(matches!(result, Err(ReportError::TotalsMismatch { .. })));
    }

    #[test]
    fn test_wrong_mode_totals_rejected() {
        let selections = vec![selection("a", 1000)];
        let travel = totals_for(&selections, ValuationMode::Travel);
        let result =
            ReportComposer::new(catalog()).compose(&selections, &travel, ValuationMode::Cash);
        assert!(matches!(result, Err(ReportError::TotalsMismatch { .. })));
    }

    #[test]
    fn test_points_mismatch_rejected() {
        let selections = vec![selection("a", 1000)];
        let mut totals = totals_for(&selections, ValuationMode::Travel);
        totals.total_points = 7;
        let result =
            ReportComposer::new(catalog()).compose(&selections, &totals, ValuationMode::Travel);
        assert_eq!(
            result,
            Err(ReportError::PointsMismatch {
                lines: 1000,
                totals: 7
            })
        );
    }

    #[test]
    fn test_unknown_program_propagates() {
        let selections = vec![selection("ghost", 1)];
        let result = ReportComposer::new(catalog()).compose(
            &selections,
            &Totals::default(),
            ValuationMode::Travel,
        );
        assert!(matches!(result, Err(ReportError::Valuation(_))));
    }

    #[test]
    fn test_zero_value_report_has_zero_shares() {
        let selections = vec![selection("a", 0)];
        let totals = totals_for(&selections, ValuationMode::Travel);
        let payload = ReportComposer::new(catalog())
            .compose(&selections, &totals, ValuationMode::Travel)
            .unwrap();
        assert_eq!(payload.pie_chart[0].share, 0.0);
    }

    #[test]
    fn test_report_id_deterministic() {
        let catalog = catalog();
        let a = vec![selection("a", 1000)];
        let b = vec![selection("a", 1001)];
        let fp = catalog.fingerprint();
        assert_eq!(
            report_id(fp, ValuationMode::Travel, &a),
            report_id(fp, ValuationMode::Travel, &a)
        );
        assert_ne!(
            report_id(fp, ValuationMode::Travel, &a),
            report_id(fp, ValuationMode::Travel, &b)
        );
        assert_ne!(
            report_id(fp, ValuationMode::Travel, &a),
            report_id(fp, ValuationMode::Cash, &a)
        );
    }

    #[test]
    fn test_payload_json_round_trip_fills_schema_version() {
        let selections = vec![selection("b", 250)];
        let totals = totals_for(&selections, ValuationMode::Travel);
        let payload = ReportComposer::new(catalog())
            .compose_at(&selections, &totals, ValuationMode::Travel, fixed_time())
            .unwrap();

        let mut value = serde_json::to_value(&payload).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let restored: ReportPayload = serde_json::from_value(value).unwrap();
        assert_eq!(restored, payload);
    }
}

//! Selection store: the programs a user has picked and their balances.
//!
//! Selections are kept in insertion order so charts and reports render
//! deterministically. Every command validates before it mutates: a rejected
//! command leaves the store exactly as it was.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::ProgramCatalog;
use crate::domain::ProgramId;

/// Largest balance accepted: every integer up to 2^53 is exact in an `f64`.
pub const MAX_POINTS: u64 = 1 << 53;

/// Errors from selection commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("unknown program '{0}'")]
    UnknownProgram(ProgramId),

    #[error("program '{0}' is not selected")]
    NotSelected(ProgramId),

    #[error("invalid points {value} for program '{program_id}': {reason}")]
    InvalidPoints {
        program_id: ProgramId,
        value: f64,
        reason: &'static str,
    },
}

/// One selected program and its entered balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub program_id: ProgramId,
    pub points: u64,
    /// Set once the user has entered a balance, even if that balance is zero.
    pub touched: bool,
}

impl Selection {
    pub fn new(program_id: ProgramId) -> Self {
        Self {
            program_id,
            points: 0,
            touched: false,
        }
    }

    /// Ready for results: a balance was entered and it is positive.
    pub fn is_complete(&self) -> bool {
        self.touched && self.points > 0
    }
}

/// Ordered, duplicate-free set of selections backed by the catalog.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    catalog: Arc<ProgramCatalog>,
    selections: Vec<Selection>,
}

impl SelectionStore {
    pub fn new(catalog: Arc<ProgramCatalog>) -> Self {
        Self {
            catalog,
            selections: Vec::new(),
        }
    }

    /// Add a program. Returns `Ok(true)` if it was newly added, `Ok(false)` if
    /// it was already selected.
    pub fn add(&mut self, program_id: &str) -> Result<bool, SelectionError> {
        if !self.catalog.contains(program_id) {
            warn!(program_id, "add rejected: unknown program");
            return Err(SelectionError::UnknownProgram(ProgramId::new(program_id)));
        }
        if self.contains(program_id) {
            return Ok(false);
        }
        self.selections.push(Selection::new(ProgramId::new(program_id)));
        debug!(program_id, selected = self.selections.len(), "program added");
        Ok(true)
    }

    /// Remove a program. Returns whether anything was removed; removing an
    /// unselected id is not an error.
    pub fn remove(&mut self, program_id: &str) -> bool {
        match self.position(program_id) {
            Some(i) => {
                self.selections.remove(i);
                debug!(program_id, selected = self.selections.len(), "program removed");
                true
            }
            None => false,
        }
    }

    /// Add when absent, remove when present (a program-row click).
    /// Returns whether the program is selected afterwards.
    pub fn toggle(&mut self, program_id: &str) -> Result<bool, SelectionError> {
        if self.remove(program_id) {
            Ok(false)
        } else {
            self.add(program_id)
        }
    }

    pub fn clear_all(&mut self) {
        let cleared = self.selections.len();
        self.selections.clear();
        debug!(cleared, "selection cleared");
    }

    /// Store a balance for a selected program and mark it touched.
    ///
    /// `value` arrives as a raw number from the entry form; it must be a
    /// finite, non-negative integer no larger than [`MAX_POINTS`].
    pub fn set_points(&mut self, program_id: &str, value: f64) -> Result<(), SelectionError> {
        let Some(i) = self.position(program_id) else {
            warn!(program_id, "set_points rejected: not selected");
            return Err(SelectionError::NotSelected(ProgramId::new(program_id)));
        };
        let points = validate_points(program_id, value)?;

        let selection = &mut self.selections[i];
        selection.points = points;
        selection.touched = true;
        debug!(program_id, points, "points set");
        Ok(())
    }

    /// Selections in insertion order.
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn get(&self, program_id: &str) -> Option<&Selection> {
        self.selections
            .iter()
            .find(|s| s.program_id.as_str() == program_id)
    }

    pub fn contains(&self, program_id: &str) -> bool {
        self.position(program_id).is_some()
    }

    /// Selections that still need a positive balance, in selection order.
    pub fn incomplete(&self) -> Vec<ProgramId> {
        self.selections
            .iter()
            .filter(|s| !s.is_complete())
            .map(|s| s.program_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn catalog(&self) -> &Arc<ProgramCatalog> {
        &self.catalog
    }

    fn position(&self, program_id: &str) -> Option<usize> {
        self.selections
            .iter()
            .position(|s| s.program_id.as_str() == program_id)
    }
}

/// Check a raw form value and convert it to a point balance.
pub fn validate_points(program_id: &str, value: f64) -> Result<u64, SelectionError> {
    let reason = if !value.is_finite() {
        Some("not a finite number")
    } else if value < 0.0 {
        Some("negative")
    } else if value.fract() != 0.0 {
        Some("not a whole number")
    } else if value > MAX_POINTS as f64 {
        Some("too large")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            warn!(program_id, value, reason, "set_points rejected: invalid points");
            Err(SelectionError::InvalidPoints {
                program_id: ProgramId::new(program_id),
                value,
                reason,
            })
        }
        None => Ok(value as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Program, Rates};

    fn store() -> SelectionStore {
        let catalog = ProgramCatalog::new(
            "USD",
            vec![
                Program::new("a", "Alpha", Rates::new(0.01, 0.005)),
                Program::new("b", "Beta", Rates::new(0.012, 0.006)),
                Program::new("c", "Gamma", Rates::new(0.015, 0.007)),
            ],
        )
        .unwrap();
        SelectionStore::new(Arc::new(catalog))
    }

    fn ids(store: &SelectionStore) -> Vec<&str> {
        store.selections().iter().map(|s| s.program_id.as_str()).collect()
    }

    #[test]
    fn test_add_creates_untouched_zero_selection() {
        let mut store = store();
        assert_eq!(store.add("a"), Ok(true));
        let selection = store.get("a").unwrap();
        assert_eq!(selection.points, 0);
        assert!(!selection.touched);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = store();
        store.add("a").unwrap();
        store.set_points("a", 500.0).unwrap();
        assert_eq!(store.add("a"), Ok(false));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().points, 500);
    }

    #[test]
    fn test_add_unknown_program() {
        let mut store = store();
        assert_eq!(
            store.add("z"),
            Err(SelectionError::UnknownProgram(ProgramId::new("z")))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = store();
        store.add("c").unwrap();
        store.add("a").unwrap();
        store.add("b").unwrap();
        store.remove("a");
        store.add("a").unwrap();
        assert_eq!(ids(&store), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_remove_unselected_is_noop() {
        let mut store = store();
        store.add("a").unwrap();
        assert!(!store.remove("b"));
        assert!(!store.remove("not-in-catalog"));
        assert_eq!(ids(&store), vec!["a"]);
    }

    #[test]
    fn test_toggle() {
        let mut store = store();
        assert_eq!(store.toggle("a"), Ok(true));
        assert_eq!(store.toggle("a"), Ok(false));
        assert!(store.is_empty());
        assert!(store.toggle("z").is_err());
    }

    #[test]
    fn test_clear_all() {
        let mut store = store();
        store.add("a").unwrap();
        store.add("b").unwrap();
        store.clear_all();
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_points_marks_touched() {
        let mut store = store();
        store.add("a").unwrap();
        store.set_points("a", 0.0).unwrap();
        let selection = store.get("a").unwrap();
        assert!(selection.touched);
        assert_eq!(selection.points, 0);
        assert!(!selection.is_complete());
    }

    #[test]
    fn test_set_points_not_selected() {
        let mut store = store();
        assert_eq!(
            store.set_points("z", 10.0),
            Err(SelectionError::NotSelected(ProgramId::new("z")))
        );
        assert_eq!(
            store.set_points("a", 10.0),
            Err(SelectionError::NotSelected(ProgramId::new("a")))
        );
    }

    #[test]
    fn test_invalid_points_leave_prior_value() {
        let mut store = store();
        store.add("a").unwrap();
        store.set_points("a", 1000.0).unwrap();

        for bad in [-1.0, 10.5, f64::NAN, f64::INFINITY, 1e300] {
            let err = store.set_points("a", bad).unwrap_err();
            assert!(matches!(err, SelectionError::InvalidPoints { .. }), "{bad}");
            assert_eq!(store.get("a").unwrap().points, 1000);
        }
    }

    #[test]
    fn test_untouched_invalid_stays_untouched() {
        let mut store = store();
        store.add("a").unwrap();
        assert!(store.set_points("a", -5.0).is_err());
        assert!(!store.get("a").unwrap().touched);
    }

    #[test]
    fn test_incomplete_lists_in_selection_order() {
        let mut store = store();
        store.add("b").unwrap();
        store.add("a").unwrap();
        store.add("c").unwrap();
        store.set_points("a", 100.0).unwrap();
        store.set_points("c", 0.0).unwrap();
        assert_eq!(
            store.incomplete(),
            vec![ProgramId::new("b"), ProgramId::new("c")]
        );
    }

    #[test]
    fn test_points_boundary_at_max_exact_integer() {
        let max = MAX_POINTS as f64;
        assert_eq!(validate_points("a", max), Ok(MAX_POINTS));

        let above = max + 2.0;
        assert!(above > max);
        assert!(matches!(
            validate_points("a", above),
            Err(SelectionError::InvalidPoints { reason: "too large", .. })
        ));

        let mut store = store();
        store.add("a").unwrap();
        store.set_points("a", max).unwrap();
        assert!(store.set_points("a", above).is_err());
        assert_eq!(store.get("a").unwrap().points, MAX_POINTS);
    }
}

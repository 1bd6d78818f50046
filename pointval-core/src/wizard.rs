//! Wizard controller: step state machine with gated forward navigation.
//!
//! Landing → Selecting → EnteringPoints → Results
//!
//! - Landing → Selecting: unconditional.
//! - Selecting → EnteringPoints: at least one program selected.
//! - EnteringPoints → Results: every selection touched with points > 0.
//! - Back: always allowed, never clears state.
//! - Start over: from any step to Selecting, clearing the selection.
//!
//! A rejected transition leaves the controller on its current step. After a
//! selection change, [`WizardController::reconcile`] steps back to the
//! furthest step whose entry gate still holds.

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Direction, ProgramId, WizardStep};
use crate::selection::SelectionStore;

/// Errors from wizard navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("select at least one program before continuing")]
    NoProgramsSelected,

    #[error("points missing or zero for: {}", join_ids(.0))]
    IncompletePoints(Vec<ProgramId>),

    #[error("no step after {0}")]
    NoNextStep(WizardStep),
}

fn join_ids(ids: &[ProgramId]) -> String {
    ids.iter()
        .map(ProgramId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default)]
pub struct WizardController {
    step: WizardStep,
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Where a forward move would land, or why it is refused.
    pub fn check_forward(&self, store: &SelectionStore) -> Result<WizardStep, WizardError> {
        match self.step {
            WizardStep::Landing => Ok(WizardStep::Selecting),
            WizardStep::Selecting => {
                if store.is_empty() {
                    Err(WizardError::NoProgramsSelected)
                } else {
                    Ok(WizardStep::EnteringPoints)
                }
            }
            WizardStep::EnteringPoints => {
                // Programs may be removed while on this step; never reach
                // Results with nothing to report.
                if store.is_empty() {
                    return Err(WizardError::NoProgramsSelected);
                }
                let incomplete = store.incomplete();
                if incomplete.is_empty() {
                    Ok(WizardStep::Results)
                } else {
                    Err(WizardError::IncompletePoints(incomplete))
                }
            }
            WizardStep::Results => Err(WizardError::NoNextStep(WizardStep::Results)),
        }
    }

    /// Whether "Next" should be enabled.
    pub fn can_advance(&self, store: &SelectionStore) -> bool {
        self.check_forward(store).is_ok()
    }

    pub fn advance(&mut self, store: &SelectionStore) -> Result<WizardStep, WizardError> {
        match self.check_forward(store) {
            Ok(next) => {
                self.enter(next);
                Ok(next)
            }
            Err(err) => {
                debug!(step = %self.step, error = %err, "forward transition rejected");
                Err(err)
            }
        }
    }

    pub fn back(&mut self) -> WizardStep {
        let prev = self.step.prev();
        if prev != self.step {
            self.enter(prev);
        }
        self.step
    }

    pub fn transition(
        &mut self,
        direction: Direction,
        store: &SelectionStore,
    ) -> Result<WizardStep, WizardError> {
        match direction {
            Direction::Forward => self.advance(store),
            Direction::Back => Ok(self.back()),
        }
    }

    /// Clear the selection and return to program selection.
    pub fn start_over(&mut self, store: &mut SelectionStore) -> WizardStep {
        store.clear_all();
        self.enter(WizardStep::Selecting);
        self.step
    }

    /// Fall back from a step whose entry gate no longer holds. Results
    /// needs every selection complete and EnteringPoints needs at least one
    /// selection.
    pub fn reconcile(&mut self, store: &SelectionStore) -> WizardStep {
        let fallback = match self.step {
            WizardStep::Results | WizardStep::EnteringPoints if store.is_empty() => {
                Some(WizardStep::Selecting)
            }
            WizardStep::Results if !store.incomplete().is_empty() => {
                Some(WizardStep::EnteringPoints)
            }
            _ => None,
        };
        if let Some(step) = fallback {
            debug!(step = %self.step, fallback = %step, "selection no longer satisfies step");
            self.enter(step);
        }
        self.step
    }

    fn enter(&mut self, step: WizardStep) {
        info!(from = %self.step, to = %step, "wizard step changed");
        self.step = step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProgramCatalog;
    use crate::domain::{Program, Rates};
    use std::sync::Arc;

    fn store() -> SelectionStore {
        let catalog = ProgramCatalog::new(
            "USD",
            vec![
                Program::new("a", "Alpha", Rates::new(0.01, 0.005)),
                Program::new("b", "Beta", Rates::new(0.012, 0.006)),
            ],
        )
        .unwrap();
        SelectionStore::new(Arc::new(catalog))
    }

    #[test]
    fn test_starts_on_landing() {
        assert_eq!(WizardController::new().step(), WizardStep::Landing);
    }

    #[test]
    fn test_landing_to_selecting_unconditional() {
        let store = store();
        let mut wizard = WizardController::new();
        assert_eq!(wizard.advance(&store), Ok(WizardStep::Selecting));
    }

    #[test]
    fn test_selecting_requires_a_program() {
        let mut store = store();
        let mut wizard = WizardController::new();
        wizard.advance(&store).unwrap();

        assert_eq!(wizard.advance(&store), Err(WizardError::NoProgramsSelected));
        assert_eq!(wizard.step(), WizardStep::Selecting);
        assert!(!wizard.can_advance(&store));

        store.add("a").unwrap();
        assert!(wizard.can_advance(&store));
        assert_eq!(wizard.advance(&store), Ok(WizardStep::EnteringPoints));
    }

    #[test]
    fn test_entering_points_lists_incomplete_programs() {
        let mut store = store();
        let mut wizard = WizardController::new();
        store.add("a").unwrap();
        store.add("b").unwrap();
        wizard.advance(&store).unwrap();
        wizard.advance(&store).unwrap();

        store.set_points("b", 500.0).unwrap();
        assert_eq!(
            wizard.advance(&store),
            Err(WizardError::IncompletePoints(vec![ProgramId::new("a")]))
        );
        assert_eq!(wizard.step(), WizardStep::EnteringPoints);

        store.set_points("a", 0.0).unwrap();
        assert!(matches!(
            wizard.advance(&store),
            Err(WizardError::IncompletePoints(_))
        ));

        store.set_points("a", 1000.0).unwrap();
        assert_eq!(wizard.advance(&store), Ok(WizardStep::Results));
    }

    #[test]
    fn test_entering_points_with_everything_removed() {
        let mut store = store();
        let mut wizard = WizardController::new();
        store.add("a").unwrap();
        wizard.advance(&store).unwrap();
        wizard.advance(&store).unwrap();
        store.remove("a");
        assert_eq!(wizard.advance(&store), Err(WizardError::NoProgramsSelected));
    }

    #[test]
    fn test_results_has_no_next_step() {
        let mut store = store();
        let mut wizard = WizardController::new();
        store.add("a").unwrap();
        store.set_points("a", 10.0).unwrap();
        for _ in 0..3 {
            wizard.advance(&store).unwrap();
        }
        assert_eq!(
            wizard.advance(&store),
            Err(WizardError::NoNextStep(WizardStep::Results))
        );
        assert_eq!(wizard.step(), WizardStep::Results);
    }

    #[test]
    fn test_back_preserves_points() {
        let mut store = store();
        let mut wizard = WizardController::new();
        store.add("a").unwrap();
        store.set_points("a", 1000.0).unwrap();
        for _ in 0..3 {
            wizard.advance(&store).unwrap();
        }

        assert_eq!(wizard.back(), WizardStep::EnteringPoints);
        assert_eq!(store.get("a").unwrap().points, 1000);
        assert_eq!(wizard.advance(&store), Ok(WizardStep::Results));
    }

    #[test]
    fn test_back_from_landing_stays() {
        let store = store();
        let mut wizard = WizardController::new();
        assert_eq!(
            wizard.transition(Direction::Back, &store),
            Ok(WizardStep::Landing)
        );
    }

    #[test]
    fn test_start_over_clears_selection() {
        let mut store = store();
        let mut wizard = WizardController::new();
        store.add("a").unwrap();
        store.set_points("a", 10.0).unwrap();
        for _ in 0..3 {
            wizard.advance(&store).unwrap();
        }

        assert_eq!(wizard.start_over(&mut store), WizardStep::Selecting);
        assert!(store.is_empty());
    }

    #[test]
    fn test_error_message_names_programs() {
        let err = WizardError::IncompletePoints(vec![ProgramId::new("a"), ProgramId::new("b")]);
        assert_eq!(err.to_string(), "points missing or zero for: a, b");
    }

    #[test]
    fn test_reconcile_falls_back_from_results() {
        let mut store = store();
        let mut wizard = WizardController::new();
        wizard.advance(&store).unwrap();
        store.add("a").unwrap();
        wizard.advance(&store).unwrap();
        store.set_points("a", 100.0).unwrap();
        wizard.advance(&store).unwrap();
        assert_eq!(wizard.reconcile(&store), WizardStep::Results);

        store.add("b").unwrap();
        assert_eq!(wizard.reconcile(&store), WizardStep::EnteringPoints);

        store.clear_all();
        assert_eq!(wizard.reconcile(&store), WizardStep::Selecting);
        assert_eq!(wizard.reconcile(&store), WizardStep::Selecting);
    }

    #[test]
    fn test_reconcile_leaves_early_steps_alone() {
        let store = store();
        let mut wizard = WizardController::new();
        assert_eq!(wizard.reconcile(&store), WizardStep::Landing);
        wizard.advance(&store).unwrap();
        assert_eq!(wizard.reconcile(&store), WizardStep::Selecting);
    }
}

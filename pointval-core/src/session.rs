//! Wizard session: the query and command surface handed to UI and report
//! collaborators.
//!
//! `Session` is single-owner and processes one command to completion before
//! the next. `SharedSession` wraps it for event-driven hosts: commands take
//! the write lock, queries the read lock, so a reader never observes a
//! half-applied command.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::catalog::ProgramCatalog;
use crate::domain::{Direction, ValuationMode, WizardStep};
use crate::selection::{Selection, SelectionError, SelectionStore};
use crate::valuation::{Totals, Valuation, ValuationEngine, ValuationError};
use crate::wizard::{WizardController, WizardError};

/// Errors surfaced through the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error("session lock poisoned by a panicking writer")]
    Poisoned,
}

/// Point-in-time view of a session, for rendering and logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub step: WizardStep,
    pub mode: ValuationMode,
    pub selections: Vec<Selection>,
    pub totals: Totals,
    pub can_advance: bool,
}

/// Everything a report needs, captured under one borrow.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub catalog: Arc<ProgramCatalog>,
    pub selections: Vec<Selection>,
    pub totals: Totals,
    pub mode: ValuationMode,
}

/// One user's pass through the wizard.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<ProgramCatalog>,
    store: SelectionStore,
    engine: ValuationEngine,
    wizard: WizardController,
}

impl Session {
    pub fn new(catalog: Arc<ProgramCatalog>) -> Self {
        Self {
            store: SelectionStore::new(Arc::clone(&catalog)),
            engine: ValuationEngine::new(Arc::clone(&catalog)),
            wizard: WizardController::new(),
            catalog,
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn catalog(&self) -> &Arc<ProgramCatalog> {
        &self.catalog
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    pub fn mode(&self) -> ValuationMode {
        self.engine.mode()
    }

    pub fn selections(&self) -> &[Selection] {
        self.store.selections()
    }

    pub fn compute_totals(&self) -> Result<Totals, ValuationError> {
        self.engine.current_totals(self.store.selections())
    }

    pub fn valuation(&self) -> Result<Valuation, ValuationError> {
        self.engine.valuate(self.store.selections())
    }

    pub fn can_advance(&self) -> bool {
        self.wizard.can_advance(&self.store)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, ValuationError> {
        Ok(SessionSnapshot {
            step: self.step(),
            mode: self.mode(),
            selections: self.selections().to_vec(),
            totals: self.compute_totals()?,
            can_advance: self.can_advance(),
        })
    }

    pub fn report_inputs(&self) -> Result<ReportInputs, ValuationError> {
        Ok(ReportInputs {
            catalog: Arc::clone(&self.catalog),
            selections: self.selections().to_vec(),
            totals: self.compute_totals()?,
            mode: self.mode(),
        })
    }

    // ── Commands ───────────────────────────────────────────────────────

    pub fn add(&mut self, program_id: &str) -> Result<bool, SelectionError> {
        let added = self.store.add(program_id)?;
        self.wizard.reconcile(&self.store);
        Ok(added)
    }

    pub fn remove(&mut self, program_id: &str) -> bool {
        let removed = self.store.remove(program_id);
        self.wizard.reconcile(&self.store);
        removed
    }

    pub fn toggle(&mut self, program_id: &str) -> Result<bool, SelectionError> {
        let selected = self.store.toggle(program_id)?;
        self.wizard.reconcile(&self.store);
        Ok(selected)
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.wizard.reconcile(&self.store);
    }

    pub fn set_points(&mut self, program_id: &str, value: f64) -> Result<(), SelectionError> {
        self.store.set_points(program_id, value)?;
        self.wizard.reconcile(&self.store);
        Ok(())
    }

    pub fn switch_mode(&mut self, mode: ValuationMode) -> bool {
        self.engine.switch_mode(mode)
    }

    pub fn toggle_mode(&mut self) -> ValuationMode {
        self.engine.toggle_mode()
    }

    pub fn transition(&mut self, direction: Direction) -> Result<WizardStep, WizardError> {
        self.wizard.transition(direction, &self.store)
    }

    pub fn start_over(&mut self) -> WizardStep {
        self.wizard.start_over(&mut self.store)
    }
}

/// A `Session` behind a read-write lock, cloneable across threads.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<RwLock<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Run a query under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> Result<R, SessionError> {
        let guard = self.inner.read().map_err(|_| SessionError::Poisoned)?;
        Ok(f(&*guard))
    }

    /// Run a command under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Result<R, SessionError> {
        let mut guard = self.inner.write().map_err(|_| SessionError::Poisoned)?;
        Ok(f(&mut *guard))
    }

    pub fn step(&self) -> Result<WizardStep, SessionError> {
        self.read(Session::step)
    }

    pub fn mode(&self) -> Result<ValuationMode, SessionError> {
        self.read(Session::mode)
    }

    pub fn selections(&self) -> Result<Vec<Selection>, SessionError> {
        self.read(|s| s.selections().to_vec())
    }

    pub fn compute_totals(&self) -> Result<Totals, SessionError> {
        Ok(self.read(Session::compute_totals)??)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        Ok(self.read(Session::snapshot)??)
    }

    pub fn report_inputs(&self) -> Result<ReportInputs, SessionError> {
        Ok(self.read(Session::report_inputs)??)
    }

    pub fn add(&self, program_id: &str) -> Result<bool, SessionError> {
        Ok(self.write(|s| s.add(program_id))??)
    }

    pub fn remove(&self, program_id: &str) -> Result<bool, SessionError> {
        self.write(|s| s.remove(program_id))
    }

    pub fn toggle(&self, program_id: &str) -> Result<bool, SessionError> {
        Ok(self.write(|s| s.toggle(program_id))??)
    }

    pub fn clear_all(&self) -> Result<(), SessionError> {
        self.write(Session::clear_all)
    }

    pub fn set_points(&self, program_id: &str, value: f64) -> Result<(), SessionError> {
        Ok(self.write(|s| s.set_points(program_id, value))??)
    }

    pub fn switch_mode(&self, mode: ValuationMode) -> Result<bool, SessionError> {
        self.write(|s| s.switch_mode(mode))
    }

    pub fn transition(&self, direction: Direction) -> Result<WizardStep, SessionError> {
        Ok(self.write(|s| s.transition(direction))??)
    }

    pub fn start_over(&self) -> Result<WizardStep, SessionError> {
        self.write(Session::start_over)
    }
}

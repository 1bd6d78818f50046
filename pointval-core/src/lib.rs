//! PointVal Core: the state behind the loyalty points value calculator.
//!
//! This crate contains the wizard's logic, with no presentation concerns:
//! - Program catalog (read-only rate table loaded from TOML)
//! - Selection store (picked programs and their balances, insertion-ordered)
//! - Valuation engine (travel / cash pricing, unrounded aggregation)
//! - Wizard controller (Landing → Selecting → EnteringPoints → Results)
//! - Session façade, with a lock-guarded variant for concurrent hosts

pub mod catalog;
pub mod domain;
pub mod selection;
pub mod session;
pub mod valuation;
pub mod wizard;

pub use catalog::{CatalogError, CatalogFile, ProgramCatalog, BUNDLED_CATALOG_TOML};
pub use domain::{
    CatalogFingerprint, Direction, ParseModeError, Program, ProgramId, Rates, ValuationMode,
    WizardStep,
};
pub use selection::{validate_points, Selection, SelectionError, SelectionStore, MAX_POINTS};
pub use session::{ReportInputs, Session, SessionError, SessionSnapshot, SharedSession};
pub use valuation::{
    format_money, group_thousands, line_value, round_to_cents, sum_values, Totals, Valuation,
    ValuationEngine, ValuationError, ValueLine,
};
pub use wizard::{WizardController, WizardError};

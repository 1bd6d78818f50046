//! Domain types for PointVal

pub mod ids;
pub mod mode;
pub mod program;
pub mod step;

pub use ids::{CatalogFingerprint, ProgramId};
pub use mode::{ParseModeError, ValuationMode};
pub use program::{Program, Rates};
pub use step::{Direction, WizardStep};

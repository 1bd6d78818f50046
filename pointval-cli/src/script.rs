//! Scripted wizard sessions for `pointval replay`.
//!
//! A script is a TOML file listing the actions a user takes, in order:
//!
//! ```toml
//! mode = "travel"
//!
//! [[steps]]
//! action = "next"
//!
//! [[steps]]
//! action = "add"
//! program = "chase-ur"
//!
//! [[steps]]
//! action = "set_points"
//! program = "chase-ur"
//! points = 80000
//! ```
//!
//! Rejected actions are recorded and the replay carries on, the way a user
//! fixes an inline error and keeps going.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use pointval_core::{Direction, Session, ValuationMode};
use pointval_report::{EmailReport, ReportComposer, ReportPayload};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Script {
    /// Mode to start in; the session default otherwise.
    #[serde(default)]
    pub mode: Option<ValuationMode>,
    #[serde(default)]
    pub steps: Vec<Action>,
}

impl Script {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse script {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Add { program: String },
    Remove { program: String },
    Toggle { program: String },
    Clear,
    SetPoints { program: String, points: f64 },
    Mode { mode: ValuationMode },
    ToggleMode,
    Next,
    Back,
    StartOver,
    /// Compose the results report, optionally addressed for email.
    Report { email: Option<String> },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Add { program } => write!(f, "add {program}"),
            Action::Remove { program } => write!(f, "remove {program}"),
            Action::Toggle { program } => write!(f, "toggle {program}"),
            Action::Clear => write!(f, "clear"),
            Action::SetPoints { program, points } => write!(f, "set_points {program} {points}"),
            Action::Mode { mode } => write!(f, "mode {mode}"),
            Action::ToggleMode => write!(f, "toggle_mode"),
            Action::Next => write!(f, "next"),
            Action::Back => write!(f, "back"),
            Action::StartOver => write!(f, "start_over"),
            Action::Report { email: Some(to) } => write!(f, "report → {to}"),
            Action::Report { email: None } => write!(f, "report"),
        }
    }
}

/// What one action did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(String),
    Rejected(String),
    Reported(Box<ReportPayload>),
    Emailed(Box<EmailReport>),
}

#[derive(Debug, Clone)]
pub struct StepRecord {
    pub index: usize,
    pub action: Action,
    pub outcome: Outcome,
}

impl StepRecord {
    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, Outcome::Rejected(_))
    }
}

/// Apply every step of `script` to `session`, in order.
pub fn replay(session: &mut Session, script: &Script) -> Vec<StepRecord> {
    if let Some(mode) = script.mode {
        session.switch_mode(mode);
    }

    script
        .steps
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let outcome = apply(session, action);
            debug!(index, %action, ?outcome, "replayed step");
            StepRecord {
                index,
                action: action.clone(),
                outcome,
            }
        })
        .collect()
}

fn apply(session: &mut Session, action: &Action) -> Outcome {
    match action {
        Action::Add { program } => match session.add(program) {
            Ok(true) => Outcome::Applied(format!("{program} selected")),
            Ok(false) => Outcome::Applied(format!("{program} already selected")),
            Err(err) => Outcome::Rejected(err.to_string()),
        },
        Action::Remove { program } => {
            if session.remove(program) {
                Outcome::Applied(format!("{program} removed"))
            } else {
                Outcome::Applied(format!("{program} was not selected"))
            }
        }
        Action::Toggle { program } => match session.toggle(program) {
            Ok(true) => Outcome::Applied(format!("{program} selected")),
            Ok(false) => Outcome::Applied(format!("{program} removed")),
            Err(err) => Outcome::Rejected(err.to_string()),
        },
        Action::Clear => {
            session.clear_all();
            Outcome::Applied("selection cleared".to_string())
        }
        Action::SetPoints { program, points } => match session.set_points(program, *points) {
            Ok(()) => Outcome::Applied(format!("{program} = {points}")),
            Err(err) => Outcome::Rejected(err.to_string()),
        },
        Action::Mode { mode } => {
            session.switch_mode(*mode);
            Outcome::Applied(format!("mode {mode}"))
        }
        Action::ToggleMode => Outcome::Applied(format!("mode {}", session.toggle_mode())),
        Action::Next => navigate(session, Direction::Forward),
        Action::Back => navigate(session, Direction::Back),
        Action::StartOver => Outcome::Applied(format!("step {}", session.start_over())),
        Action::Report { email } => {
            let payload = session
                .report_inputs()
                .map_err(|err| err.to_string())
                .and_then(|inputs| {
                    ReportComposer::compose_inputs(&inputs).map_err(|err| err.to_string())
                });
            match (payload, email) {
                (Ok(payload), Some(to)) => {
                    Outcome::Emailed(Box::new(EmailReport::new(payload, to.clone())))
                }
                (Ok(payload), None) => Outcome::Reported(Box::new(payload)),
                (Err(err), _) => Outcome::Rejected(err),
            }
        }
    }
}

fn navigate(session: &mut Session, direction: Direction) -> Outcome {
    match session.transition(direction) {
        Ok(step) => Outcome::Applied(format!("step {step}")),
        Err(err) => Outcome::Rejected(err.to_string()),
    }
}

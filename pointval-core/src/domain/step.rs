use serde::{Deserialize, Serialize};
use std::fmt;

/// Wizard steps in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Landing,
    Selecting,
    EnteringPoints,
    Results,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Landing,
        WizardStep::Selecting,
        WizardStep::EnteringPoints,
        WizardStep::Results,
    ];

    pub fn index(self) -> usize {
        match self {
            WizardStep::Landing => 0,
            WizardStep::Selecting => 1,
            WizardStep::EnteringPoints => 2,
            WizardStep::Results => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Landing => "Landing",
            WizardStep::Selecting => "Select programs",
            WizardStep::EnteringPoints => "Enter points",
            WizardStep::Results => "Results",
        }
    }

    /// The following step, `None` from `Results`.
    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The preceding step; `Landing` stays put.
    pub fn prev(self) -> WizardStep {
        match self {
            WizardStep::Landing => WizardStep::Landing,
            other => Self::ALL[other.index() - 1],
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Navigation direction requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Back,
}

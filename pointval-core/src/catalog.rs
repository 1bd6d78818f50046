//! Program catalog: read-only reference data loaded from TOML.
//!
//! The catalog is the only source of conversion rates. Lookups for ids that
//! are not listed fail with `CatalogError::NotFound`; there is no fallback
//! rate.
//!
//! File format:
//!
//! ```toml
//! currency = "USD"
//!
//! [[programs]]
//! id = "chase-ur"
//! name = "Chase Ultimate Rewards"
//! icon = "icons/chase-ur.svg"
//! popular = true
//! rate = { travel = 0.02, cash = 0.01 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::domain::{CatalogFingerprint, Program, ProgramId, ValuationMode};

/// Illustrative catalog compiled into the binary.
pub const BUNDLED_CATALOG_TOML: &str = include_str!("../data/default_catalog.toml");

/// Errors from loading or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("program '{0}' not found in catalog")]
    NotFound(ProgramId),

    #[error("failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to fingerprint catalog: {0}")]
    Fingerprint(#[from] serde_json::Error),

    #[error("catalog lists no programs")]
    Empty,

    #[error("program id must not be empty")]
    EmptyId,

    #[error("duplicate program id '{0}'")]
    DuplicateId(ProgramId),

    #[error("program '{0}' has an empty name")]
    EmptyName(ProgramId),

    #[error("program '{id}' has invalid {mode} rate {rate} (must be finite and > 0)")]
    InvalidRate {
        id: ProgramId,
        mode: ValuationMode,
        rate: f64,
    },

    #[error("invalid currency code '{0}' (expected three uppercase letters)")]
    InvalidCurrency(String),
}

/// On-disk catalog shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogFile {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub programs: Vec<Program>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Validated, indexed program catalog.
#[derive(Debug, Clone)]
pub struct ProgramCatalog {
    currency: String,
    programs: Vec<Program>,
    index: HashMap<ProgramId, usize>,
    fingerprint: CatalogFingerprint,
}

impl ProgramCatalog {
    /// Build a catalog, validating ids, names, rates and currency.
    pub fn new(currency: impl Into<String>, programs: Vec<Program>) -> Result<Self, CatalogError> {
        let currency = currency.into();
        validate_currency(&currency)?;
        if programs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(programs.len());
        for (i, program) in programs.iter().enumerate() {
            validate_program(program)?;
            if index.insert(program.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(program.id.clone()));
            }
        }

        let canonical = serde_json::to_vec(&CatalogFile {
            currency: currency.clone(),
            programs: programs.clone(),
        })?;
        let fingerprint = CatalogFingerprint::from_bytes(&canonical);

        debug!(
            programs = programs.len(),
            %currency,
            fingerprint = fingerprint.short(),
            "catalog loaded"
        );

        Ok(Self {
            currency,
            programs,
            index,
            fingerprint,
        })
    }

    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        Self::new(file.currency, file.programs)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_file(file)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The illustrative catalog shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUNDLED_CATALOG_TOML)
    }

    /// Look up a program by id.
    pub fn lookup(&self, id: &str) -> Result<&Program, CatalogError> {
        self.get(id)
            .ok_or_else(|| CatalogError::NotFound(ProgramId::new(id)))
    }

    pub fn get(&self, id: &str) -> Option<&Program> {
        self.index.get(id).map(|&i| &self.programs[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All programs in catalog order.
    pub fn list(&self) -> &[Program] {
        &self.programs
    }

    /// Programs flagged popular, in catalog order.
    pub fn popular(&self) -> Vec<&Program> {
        self.programs.iter().filter(|p| p.popular).collect()
    }

    /// Case-insensitive substring match on name or id. An empty query
    /// returns the whole catalog.
    pub fn search(&self, query: &str) -> Vec<&Program> {
        let needle = query.trim().to_lowercase();
        self.programs
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.id.as_str().to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn fingerprint(&self) -> &CatalogFingerprint {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

fn validate_currency(code: &str) -> Result<(), CatalogError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(CatalogError::InvalidCurrency(code.to_string()))
    }
}

fn validate_program(program: &Program) -> Result<(), CatalogError> {
    if program.id.as_str().trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }
    if program.name.trim().is_empty() {
        return Err(CatalogError::EmptyName(program.id.clone()));
    }
    for mode in ValuationMode::ALL {
        let rate = program.rate_for(mode);
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CatalogError::InvalidRate {
                id: program.id.clone(),
                mode,
                rate,
            });
        }
    }
    Ok(())
}

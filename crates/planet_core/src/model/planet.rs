//! Planet domain model.
//!
//! # Responsibility
//! - Define the planet record and its wire shape.
//! - Provide field validation shared by repository and HTTP layers.
//!
//! # Invariants
//! - `name`, `climate` and `terrain` are non-blank for every persisted planet.
//! - `id` is `None` until the store assigns one on insert.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned planet identifier.
pub type PlanetId = i64;

/// Validation errors for planet field invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanetValidationError {
    EmptyName,
    EmptyClimate,
    EmptyTerrain,
}

impl PlanetValidationError {
    /// Wire name of the offending field.
    pub fn field(self) -> &'static str {
        match self {
            Self::EmptyName => "name",
            Self::EmptyClimate => "climate",
            Self::EmptyTerrain => "terrain",
        }
    }
}

impl Display for PlanetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "planet {} must not be empty", self.field())
    }
}

impl Error for PlanetValidationError {}

/// Canonical planet record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    /// Ignored on input; always populated on output.
    #[serde(default)]
    pub id: Option<PlanetId>,
    /// Unique, case-sensitive.
    pub name: String,
    pub climate: String,
    pub terrain: String,
}

impl Planet {
    /// Creates an unsaved planet without an id.
    pub fn new(
        name: impl Into<String>,
        climate: impl Into<String>,
        terrain: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            climate: climate.into(),
            terrain: terrain.into(),
        }
    }

    /// Returns a copy carrying the given store id.
    pub fn with_id(mut self, id: PlanetId) -> Self {
        self.id = Some(id);
        self
    }

    /// Checks field invariants in `name`, `climate`, `terrain` order.
    ///
    /// Whitespace-only values count as empty.
    pub fn validate(&self) -> Result<(), PlanetValidationError> {
        if is_blank(&self.name) {
            return Err(PlanetValidationError::EmptyName);
        }
        if is_blank(&self.climate) {
            return Err(PlanetValidationError::EmptyClimate);
        }
        if is_blank(&self.terrain) {
            return Err(PlanetValidationError::EmptyTerrain);
        }
        Ok(())
    }
}

/// Returns whether a field value should be treated as absent.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

//! Layout configuration.
//!
//! Every field is optional in JSON; missing fields take the defaults below.
//! Distances given "in spaces" are multiplied by `unitsPerSpace`.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::geometry::Color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Horizontal budget of one system.
    pub max_system_width: f64,
    /// Logical units per staff space (distance between two staff lines).
    pub units_per_space: f64,
    /// Vertical gap between consecutive systems.
    pub system_spacing: f64,
    /// Gap between staves of one instrument, in staff spaces.
    pub staff_gap: f64,
    /// Gap between instruments, in staff spaces.
    pub instrument_gap: f64,
    /// Per-voice colours, cycled by voice index. Empty means black.
    pub voice_colors: Vec<Color>,
    pub spacing: SpacingConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_system_width: 800.0,
            units_per_space: 10.0,
            system_spacing: 150.0,
            staff_gap: 6.0,
            instrument_gap: 8.0,
            voice_colors: Vec::new(),
            spacing: SpacingConfig::default(),
        }
    }
}

/// Parameters of the duration → width formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpacingConfig {
    pub base_spacing: f64,
    /// Extra width per quarter note of duration.
    pub duration_factor: f64,
    pub minimum_spacing: f64,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            base_spacing: 20.0,
            duration_factor: 40.0,
            minimum_spacing: 20.0,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::Configuration {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::Configuration {
            field,
            reason: format!("must not be negative, got {value}"),
        })
    }
}

impl LayoutConfig {
    /// Check every field, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        positive("maxSystemWidth", self.max_system_width)?;
        positive("unitsPerSpace", self.units_per_space)?;
        non_negative("systemSpacing", self.system_spacing)?;
        if !(self.staff_gap.is_finite() && self.staff_gap >= 2.0) {
            return Err(LayoutError::Configuration {
                field: "staffGap",
                reason: format!("must be at least 2 staff spaces, got {}", self.staff_gap),
            });
        }
        non_negative("instrumentGap", self.instrument_gap)?;
        self.spacing.validate()
    }

    /// Gap between staves of one instrument, in logical units.
    pub fn staff_gap_units(&self) -> f64 {
        self.staff_gap * self.units_per_space
    }

    /// Gap between instruments, in logical units.
    pub fn instrument_gap_units(&self) -> f64 {
        self.instrument_gap * self.units_per_space
    }
}

impl SpacingConfig {
    pub fn validate(&self) -> Result<()> {
        positive("spacing.baseSpacing", self.base_spacing)?;
        positive("spacing.durationFactor", self.duration_factor)?;
        positive("spacing.minimumSpacing", self.minimum_spacing)
    }
}

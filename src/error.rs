//! Errors and non-fatal warnings produced by a layout pass.

use serde::Serialize;
use thiserror::Error;

use crate::layout::types::SourceReference;

/// Fatal conditions. A failed pass produces no partial layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid configuration: {field} {reason}")]
    Configuration { field: &'static str, reason: String },

    #[error("no font metrics for glyph '{glyph}'")]
    UnresolvableReference { glyph: String },

    #[error("failed to load embedded font metrics: {0}")]
    MetricsLoad(String),

    #[error("invalid score: {0}")]
    InvalidScore(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Informational findings attached to a successful layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayoutWarning {
    /// Two noteheads or accidentals of different events overlap.
    #[serde(rename_all = "camelCase")]
    SpacingCollision {
        first: SourceReference,
        second: SourceReference,
        system_index: usize,
    },
    /// A single measure is wider than `maxSystemWidth`; it got a system of
    /// its own.
    #[serde(rename_all = "camelCase")]
    OversizedMeasure {
        measure_index: usize,
        width: f64,
        max_system_width: f64,
    },
    /// A key or time change did not fall on a measure boundary, or a clef
    /// change had no later column in its measure, and it was moved forward
    /// to the next boundary.
    #[serde(rename_all = "camelCase")]
    SnappedStructuralChange { tick: u32, applied_at: u32 },
    /// A structural change came after the last place it could apply and
    /// has no effect on the layout.
    #[serde(rename_all = "camelCase")]
    UnappliedStructuralChange { tick: u32 },
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::SpacingCollision {
                first,
                second,
                system_index,
            } => write!(
                f,
                "glyphs of {first} and {second} overlap in system {system_index}"
            ),
            LayoutWarning::OversizedMeasure {
                measure_index,
                width,
                max_system_width,
            } => write!(
                f,
                "measure {measure_index} is {width} wide, more than the system width {max_system_width}"
            ),
            LayoutWarning::SnappedStructuralChange { tick, applied_at } => write!(
                f,
                "structural change at tick {tick} moved to measure boundary {applied_at}"
            ),
            LayoutWarning::UnappliedStructuralChange { tick } => {
                write!(f, "structural change at tick {tick} has nothing after it to apply to and was ignored")
            }
        }
    }
}

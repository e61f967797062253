//! Horizontal spacing within a measure.
//!
//! A column gets `max(base + quarters × factor, minimum)` of room after its
//! notehead, plus an optional lead-in before it for an inline clef change
//! and for accidentals. The leftmost lead-in glyph stays 1.5 staff spaces
//! clear of the notehead before it.

use crate::config::SpacingConfig;
use crate::geometry::round2;
use crate::model::{TimeSignature, TICKS_PER_QUARTER};

use super::constants::{ACCIDENTAL_LEAD_PAD, ACCIDENTAL_NOTEHEAD_GAP, INLINE_CLEF_GAP};

/// Input for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    /// Shortest duration among the events starting in this column
    pub duration: u32,
    /// Room reserved before the notehead (zero without accidentals)
    pub lead_in: f64,
}

/// Spacing of one measure's columns, relative to the content start.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasureSpacing {
    pub widths: Vec<f64>,
    /// Notehead x of each column
    pub offsets: Vec<f64>,
    pub total_width: f64,
}

/// Width allotted to a column of the given duration.
pub fn column_width(duration_ticks: u32, spacing: &SpacingConfig) -> f64 {
    let quarters = duration_ticks as f64 / TICKS_PER_QUARTER as f64;
    round2((spacing.base_spacing + quarters * spacing.duration_factor).max(spacing.minimum_spacing))
}

/// Lead-in reserved for an accidental of the given advance width.
pub fn accidental_lead_in(accidental_advance: f64, units_per_space: f64) -> f64 {
    round2(accidental_advance + ACCIDENTAL_LEAD_PAD * units_per_space)
}

/// Lead-in reserved for an inline clef of the given advance width.
pub fn clef_lead_in(clef_advance: f64, units_per_space: f64) -> f64 {
    round2(clef_advance + INLINE_CLEF_GAP * units_per_space)
}

/// The notehead nearest before a lead-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviousHead {
    /// From the notehead origin to the start of the lead-in
    pub room: f64,
    pub width: f64,
}

impl PreviousHead {
    /// The same notehead seen from `extra` units further right.
    pub fn further(self, extra: f64) -> Self {
        Self {
            room: round2(self.room + extra),
            ..self
        }
    }
}

/// Glyphs drawn in a column's lead-in, right-aligned against the notehead:
/// an inline clef, then an accidental.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LeadIn {
    pub clef_advance: Option<f64>,
    pub accidental_advance: Option<f64>,
}

impl LeadIn {
    /// Width of the accidental part, measured left from the notehead.
    pub fn accidental_part(&self, units_per_space: f64) -> f64 {
        self.accidental_advance
            .map_or(0.0, |a| accidental_lead_in(a, units_per_space))
    }

    /// Distance from the notehead origin back to the inline clef origin.
    pub fn clef_offset(&self, units_per_space: f64) -> Option<f64> {
        self.clef_advance.map(|a| {
            round2(self.accidental_part(units_per_space) + clef_lead_in(a, units_per_space))
        })
    }

    /// Total lead-in, widened when the leftmost glyph would come closer
    /// than 1.5 staff spaces to `previous`.
    pub fn width(&self, previous: Option<PreviousHead>, units_per_space: f64) -> f64 {
        let natural = self
            .clef_offset(units_per_space)
            .unwrap_or_else(|| self.accidental_part(units_per_space));
        if natural == 0.0 {
            return 0.0;
        }
        // Offset of the leftmost glyph from the start of the lead-in.
        let leftmost = if self.clef_advance.is_some() {
            0.0
        } else {
            (ACCIDENTAL_LEAD_PAD - ACCIDENTAL_NOTEHEAD_GAP) * units_per_space
        };
        let deficit = previous.map_or(0.0, |p| {
            p.width + ACCIDENTAL_LEAD_PAD * units_per_space - p.room - leftmost
        });
        round2(natural + deficit.max(0.0))
    }
}

/// Lay out columns left to right: each offset is the sum of all earlier
/// widths and of every lead-in up to and including its own.
pub fn space_columns(columns: &[ColumnSpec], spacing: &SpacingConfig) -> MeasureSpacing {
    let mut widths = Vec::with_capacity(columns.len());
    let mut offsets = Vec::with_capacity(columns.len());
    let mut cursor = 0.0;
    for column in columns {
        cursor = round2(cursor + column.lead_in);
        offsets.push(cursor);
        let width = column_width(column.duration, spacing);
        widths.push(width);
        cursor = round2(cursor + width);
    }
    MeasureSpacing {
        widths,
        offsets,
        total_width: cursor,
    }
}

/// Width of a measure in which no event starts: one beat-length column
/// per beat.
pub fn empty_measure_width(time: TimeSignature, spacing: &SpacingConfig) -> f64 {
    round2(time.numerator as f64 * column_width(time.beat_ticks(), spacing))
}

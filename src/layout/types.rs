//! Output entities of a layout pass.
//!
//! Everything inside a [`System`] is positioned relative to the top-left
//! corner of that system's bounding box; the systems themselves are placed
//! in global coordinates. Field names serialize in camelCase, in
//! declaration order, which makes the compact JSON encoding canonical.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{serialize_rounded, BoundingBox, Color, Point, TickRange};

pub use crate::model::BracketType;

/// The complete spatial model of a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLayout {
    pub systems: Vec<System>,
    /// Width of the widest system
    #[serde(serialize_with = "serialize_rounded")]
    pub total_width: f64,
    /// Sum of system heights plus the spacing between them
    #[serde(serialize_with = "serialize_rounded")]
    pub total_height: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub units_per_space: f64,
}

impl GlobalLayout {
    pub fn empty(units_per_space: f64) -> Self {
        Self {
            systems: Vec::new(),
            total_width: 0.0,
            total_height: 0.0,
            units_per_space,
        }
    }

    /// Compact JSON, stable across runs and platforms.
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// UTF-8 bytes of [`GlobalLayout::to_canonical_json`], suitable as a
    /// cache key input.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn staves(&self) -> impl Iterator<Item = &Staff> + '_ {
        self.systems
            .iter()
            .flat_map(|s| s.staff_groups.iter())
            .flat_map(|g| g.staves.iter())
    }

    /// Glyphs inside runs (structural glyphs not included).
    pub fn glyph_count(&self) -> usize {
        self.staves()
            .flat_map(|s| s.glyph_runs.iter())
            .map(|r| r.glyphs.len())
            .sum()
    }

    pub fn run_count(&self) -> usize {
        self.staves().map(|s| s.glyph_runs.len()).sum()
    }
}

/// One horizontal line of music spanning every instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub index: usize,
    pub bounding_box: BoundingBox,
    pub tick_range: TickRange,
    pub staff_groups: Vec<StaffGroup>,
}

/// The staves of one instrument within a system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffGroup {
    pub instrument_id: String,
    pub bracket_type: BracketType,
    pub bounding_box: BoundingBox,
    pub staves: Vec<Staff>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub staff_lines: [StaffLine; 5],
    /// Clefs, key signatures and time signatures
    pub structural_glyphs: Vec<Glyph>,
    pub glyph_runs: Vec<GlyphRun>,
    pub bar_lines: Vec<BarLine>,
    pub bounding_box: BoundingBox,
}

impl Staff {
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> + '_ {
        self.glyph_runs.iter().flat_map(|r| r.glyphs.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLine {
    #[serde(serialize_with = "serialize_rounded")]
    pub y_position: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub start_x: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub end_x: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarLine {
    #[serde(serialize_with = "serialize_rounded")]
    pub x_position: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub y_start: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub y_end: f64,
    pub bar_type: BarType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BarType {
    Single,
    /// Closes the last measure of the score
    Final,
}

/// Consecutive glyphs sharing one draw style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphRun {
    pub glyphs: Vec<Glyph>,
    pub font_family: String,
    #[serde(serialize_with = "serialize_rounded")]
    pub font_size: f64,
    pub color: Color,
    #[serde(serialize_with = "serialize_rounded")]
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Glyph {
    /// Glyph origin (SMuFL baseline point)
    pub position: Point,
    pub bounding_box: BoundingBox,
    /// SMuFL codepoint
    pub codepoint: u32,
    /// Absent for structural glyphs that come from a staff's initial state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<SourceReference>,
}

/// Index path from a glyph back to the event that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub instrument_id: String,
    pub staff_index: usize,
    pub voice_index: usize,
    pub event_index: usize,
}

impl std::fmt::Display for SourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/staff {}/voice {}/event {}",
            self.instrument_id, self.staff_index, self.voice_index, self.event_index
        )
    }
}

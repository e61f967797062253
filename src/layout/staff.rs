//! Staff and staff-group assembly: vertical stacking of staves, staff
//! lines, bracket choice, structural glyphs (clef, key, time) and bar lines.

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::geometry::{round2, BoundingBox, Point};
use crate::model::{BracketType, CompiledScore, Instrument};

use super::constants::*;
use super::glyphs::{source_reference, GlyphContext};
use super::measures::{GridMeasure, InlineClef, MeasureGrid, StaffHeader};
use super::positioner::{
    clef_anchor_position, clef_glyph_name, key_signature_accidentals, position_to_y,
};
use super::types::{BarLine, BarType, Glyph, Staff, StaffLine};

// ═══════════════════════════════════════════════════════════════════════
// Groups and vertical stacking
// ═══════════════════════════════════════════════════════════════════════

/// Bracket for an instrument: the upstream value when present, otherwise
/// a brace for multi-staff instruments and nothing for single staves.
pub fn bracket_type(instrument: &Instrument) -> BracketType {
    match instrument.bracket {
        Some(bracket) => bracket,
        None if instrument.staves.len() > 1 => BracketType::Brace,
        None => BracketType::None,
    }
}

/// Top-line y of every staff slot, with the first staff at 0.
pub fn staff_tops(grid: &MeasureGrid, config: &LayoutConfig) -> Vec<f64> {
    let staff_height = STAFF_HEIGHT_SPACES * config.units_per_space;
    let mut tops = Vec::with_capacity(grid.slots.len());
    let mut y = 0.0;
    for (i, slot) in grid.slots.iter().enumerate() {
        if i > 0 {
            let gap = if slot.instrument == grid.slots[i - 1].instrument {
                config.staff_gap_units()
            } else {
                config.instrument_gap_units()
            };
            y = round2(y + staff_height + gap);
        }
        tops.push(y);
    }
    tops
}

/// Five lines one staff space apart, from `start_x` to `end_x`.
pub fn staff_lines(top: f64, start_x: f64, end_x: f64, units_per_space: f64) -> [StaffLine; 5] {
    std::array::from_fn(|i| StaffLine {
        y_position: round2(top + i as f64 * units_per_space),
        start_x: round2(start_x),
        end_x: round2(end_x),
    })
}

pub fn bar_line(x: f64, top: f64, units_per_space: f64, bar_type: BarType) -> BarLine {
    BarLine {
        x_position: round2(x),
        y_start: round2(top),
        y_end: round2(top + STAFF_HEIGHT_SPACES * units_per_space),
        bar_type,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Measure headers (clef, key signature, time signature)
// ═══════════════════════════════════════════════════════════════════════

/// Horizontal plan of a measure's structural glyphs, shared by every staff
/// so time signatures line up. Offsets are relative to the measure start.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeaderPlan {
    pub clef_x: f64,
    pub key_x: f64,
    pub time_x: f64,
    /// Width of the time-signature digits column
    pub time_width: f64,
    /// Total lead-in before the first column; zero when nothing is shown
    pub width: f64,
}

fn digits(n: u32) -> Vec<usize> {
    n.to_string()
        .bytes()
        .map(|b| (b - b'0') as usize)
        .collect()
}

fn number_width(ctx: &GlyphContext<'_>, n: u32) -> Result<f64> {
    let mut width = 0.0;
    for d in digits(n) {
        width += ctx.metrics.glyph(TIME_SIG_DIGITS[d])?.advance(ctx.units_per_space);
    }
    Ok(round2(width))
}

fn key_width(ctx: &GlyphContext<'_>, header: &StaffHeader, measure: &GridMeasure, slot: usize) -> Result<f64> {
    let Some(key) = header.key else {
        return Ok(0.0);
    };
    let clef = measure.states[slot].clef;
    let mut width = 0.0;
    for (_, accidental) in key_signature_accidentals(key.value.from, key.value.to, clef) {
        let advance = ctx.metrics.glyph(accidental.glyph_name())?.advance(ctx.units_per_space);
        width += advance + KEY_ACCIDENTAL_GAP * ctx.units_per_space;
    }
    Ok(round2(width))
}

/// Lay out the structural segments of a measure.
pub fn plan_header(ctx: &GlyphContext<'_>, measure: &GridMeasure) -> Result<HeaderPlan> {
    if !measure.has_header() {
        return Ok(HeaderPlan::default());
    }
    let ups = ctx.units_per_space;
    let gap = HEADER_SEGMENT_GAP * ups;

    let mut clef_width: f64 = 0.0;
    let mut key_segment: f64 = 0.0;
    let mut time_width: f64 = 0.0;
    for (slot, header) in measure.headers.iter().enumerate() {
        if let Some(clef) = header.clef {
            let advance = ctx.metrics.glyph(clef_glyph_name(clef.value))?.advance(ups);
            clef_width = clef_width.max(advance);
        }
        key_segment = key_segment.max(key_width(ctx, header, measure, slot)?);
        if let Some(time) = header.time {
            let numerator = number_width(ctx, time.value.numerator)?;
            let denominator = number_width(ctx, time.value.denominator)?;
            time_width = time_width.max(numerator.max(denominator));
        }
    }

    let clef_segment = if clef_width > 0.0 { clef_width + gap } else { 0.0 };
    let key_segment = if key_segment > 0.0 { key_segment + gap } else { 0.0 };
    let time_segment = if time_width > 0.0 { time_width + gap } else { 0.0 };
    let content = clef_segment + key_segment + time_segment;
    if content == 0.0 {
        return Ok(HeaderPlan::default());
    }

    let clef_x = round2(HEADER_LEFT_PAD * ups);
    let key_x = round2(clef_x + clef_segment);
    let time_x = round2(key_x + key_segment);
    Ok(HeaderPlan {
        clef_x,
        key_x,
        time_x,
        time_width,
        width: round2(time_x + time_segment),
    })
}

/// Structural glyphs of one staff at the start of a measure, in drawing
/// order: clef, key-signature accidentals, time-signature digits.
pub fn emit_header(
    ctx: &GlyphContext<'_>,
    score: &CompiledScore,
    plan: &HeaderPlan,
    measure: &GridMeasure,
    slot: usize,
    measure_x: f64,
    staff_top: f64,
) -> Result<Vec<Glyph>> {
    let header = &measure.headers[slot];
    let clef = measure.states[slot].clef;
    let ups = ctx.units_per_space;
    let mut out = Vec::new();

    if let Some(shown) = header.clef {
        let metrics = ctx.metrics.glyph(clef_glyph_name(shown.value))?;
        let y = position_to_y(clef_anchor_position(shown.value), staff_top, ups);
        let source = shown.source.map(|s| source_reference(score, s));
        out.push(ctx.glyph(metrics, Point::new(measure_x + plan.clef_x, y), source));
    }

    if let Some(shown) = header.key {
        let source = shown.source.map(|s| source_reference(score, s));
        let mut x = measure_x + plan.key_x;
        for (position, accidental) in
            key_signature_accidentals(shown.value.from, shown.value.to, clef)
        {
            let metrics = ctx.metrics.glyph(accidental.glyph_name())?;
            let y = position_to_y(position, staff_top, ups);
            out.push(ctx.glyph(metrics, Point::new(x, y), source.clone()));
            x += metrics.advance(ups) + KEY_ACCIDENTAL_GAP * ups;
        }
    }

    if let Some(shown) = header.time {
        let source = shown.source.map(|s| source_reference(score, s));
        for (number, position) in [
            (shown.value.numerator, TIME_NUMERATOR_POSITION),
            (shown.value.denominator, TIME_DENOMINATOR_POSITION),
        ] {
            let width = number_width(ctx, number)?;
            let mut x = measure_x + plan.time_x + (plan.time_width - width) / 2.0;
            let y = position_to_y(position, staff_top, ups);
            for d in digits(number) {
                let metrics = ctx.metrics.glyph(TIME_SIG_DIGITS[d])?;
                out.push(ctx.glyph(metrics, Point::new(x, y), source.clone()));
                x += metrics.advance(ups);
            }
        }
    }

    Ok(out)
}

/// A clef change drawn inside a measure, with its origin at `x`.
pub fn emit_inline_clef(
    ctx: &GlyphContext<'_>,
    score: &CompiledScore,
    inline: &InlineClef,
    x: f64,
    staff_top: f64,
) -> Result<Glyph> {
    let metrics = ctx.metrics.glyph(clef_glyph_name(inline.clef))?;
    let y = position_to_y(clef_anchor_position(inline.clef), staff_top, ctx.units_per_space);
    let source = source_reference(score, inline.source);
    Ok(ctx.glyph(metrics, Point::new(round2(x), y), Some(source)))
}

// ═══════════════════════════════════════════════════════════════════════
// Staff assembly
// ═══════════════════════════════════════════════════════════════════════

/// Bounding box of a staff: its lines, bar lines and every glyph.
pub fn staff_bounds(staff: &Staff) -> BoundingBox {
    let first = &staff.staff_lines[0];
    let last = &staff.staff_lines[STAFF_LINE_COUNT - 1];
    let lines = BoundingBox::from_corners(first.start_x, first.y_position, last.end_x, last.y_position);
    let bars = staff
        .bar_lines
        .iter()
        .map(|b| BoundingBox::from_corners(b.x_position, b.y_start, b.x_position, b.y_end));
    let glyphs = staff
        .structural_glyphs
        .iter()
        .chain(staff.glyphs())
        .map(|g| g.bounding_box);
    bars.chain(glyphs).fold(lines, |acc, b| acc.union(&b))
}

/// Move every coordinate of a staff by `(dx, dy)`.
pub fn translate_staff(staff: &mut Staff, dx: f64, dy: f64) {
    for line in staff.staff_lines.iter_mut() {
        line.y_position = round2(line.y_position + dy);
        line.start_x = round2(line.start_x + dx);
        line.end_x = round2(line.end_x + dx);
    }
    for bar in staff.bar_lines.iter_mut() {
        bar.x_position = round2(bar.x_position + dx);
        bar.y_start = round2(bar.y_start + dy);
        bar.y_end = round2(bar.y_end + dy);
    }
    let glyphs = staff
        .structural_glyphs
        .iter_mut()
        .chain(staff.glyph_runs.iter_mut().flat_map(|r| r.glyphs.iter_mut()));
    for glyph in glyphs {
        glyph.position = glyph.position.translated(dx, dy);
        glyph.bounding_box = glyph.bounding_box.translated(dx, dy);
    }
    staff.bounding_box = staff.bounding_box.translated(dx, dy);
}

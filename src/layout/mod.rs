//! Layout engine — converts a compiled score into a [`GlobalLayout`].
//!
//! The pass is a pure function of the score, the configuration and the
//! font metrics. Stages run in a fixed order:
//!
//! 1. measure grid (boundaries, structural state, columns)
//! 2. per-measure preparation (pitch placement, accidentals, spacing)
//! 3. system breaking
//! 4. per-system assembly (staves, glyphs, runs, bounding boxes)
//! 5. system stacking

mod batcher;
mod breaker;
mod collisions;
mod constants;
mod glyphs;
mod measures;
mod positioner;
mod spacer;
mod staff;
pub mod types;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::{LayoutWarning, Result};
use crate::geometry::{round2, BoundingBox};
use crate::metrics::FontMetrics;
use crate::model::CompiledScore;

use breaker::{stack_systems, stacked_height};
use collisions::detect_collisions;
use glyphs::{
    emit_note, emit_rest, notehead_name, source_reference, EmittedGlyph, GlyphContext, GlyphKind,
};
use measures::{build_grid, GridMeasure, MeasureGrid};
use positioner::{clef_glyph_name, position_pitch, AccidentalState, PitchPlacement};
use spacer::{empty_measure_width, LeadIn, PreviousHead};
use staff::{
    bar_line, bracket_type, emit_header, emit_inline_clef, plan_header, staff_bounds, staff_lines,
    staff_tops, translate_staff, HeaderPlan,
};
use types::{BarType, GlobalLayout, Staff, StaffGroup, System};

pub use batcher::{batch_glyphs, DrawStyle};
pub use breaker::{break_into_systems, MeasureInfo, SystemBreak};
pub use positioner::{spell, staff_position, Accidental, Spelling};
pub use spacer::{column_width, space_columns, ColumnSpec, MeasureSpacing};

/// A finished layout and the non-fatal findings made while computing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    pub layout: GlobalLayout,
    pub warnings: Vec<LayoutWarning>,
}

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Compute the layout of `score` with the embedded font metrics.
///
/// The configuration is validated before anything else; an invalid value
/// fails the call with `LayoutError::Configuration`.
pub fn compute_layout(score: &CompiledScore, config: &LayoutConfig) -> Result<LayoutResult> {
    config.validate()?;
    let metrics = FontMetrics::embedded()?;
    compute_layout_with_metrics(score, config, metrics)
}

/// Compute the layout of `score` with explicit font metrics.
pub fn compute_layout_with_metrics(
    score: &CompiledScore,
    config: &LayoutConfig,
    metrics: &FontMetrics,
) -> Result<LayoutResult> {
    config.validate()?;
    score.validate()?;

    let ctx = GlyphContext {
        metrics,
        units_per_space: config.units_per_space,
        voice_colors: &config.voice_colors,
    };
    let mut warnings = Vec::new();

    let grid = build_grid(score, &mut warnings)?;
    if grid.measures.is_empty() {
        log::debug!("score has no measures; returning an empty layout");
        return Ok(finish(GlobalLayout::empty(config.units_per_space), warnings));
    }

    let mut prepared = Vec::with_capacity(grid.measures.len());
    let mut tail = None;
    for measure in &grid.measures {
        let pm = prepare_measure(&ctx, measure, config, tail)?;
        tail = pm.tail;
        prepared.push(pm);
    }

    let infos: Vec<MeasureInfo> = prepared
        .iter()
        .map(|p| MeasureInfo {
            index: p.measure.index,
            width: p.width,
            tick_range: p.measure.tick_range,
        })
        .collect();
    let breaks = break_into_systems(&infos, config.max_system_width, &mut warnings);

    let tops = staff_tops(&grid, config);
    let mut systems = Vec::with_capacity(breaks.len());
    for brk in &breaks {
        let (system, collisions) = assemble_system(&ctx, score, &grid, &prepared, brk, &tops)?;
        warnings.extend(collisions);
        systems.push(system);
    }

    let heights: Vec<f64> = systems.iter().map(|s| s.bounding_box.height).collect();
    for (system, top) in systems
        .iter_mut()
        .zip(stack_systems(&heights, config.system_spacing))
    {
        system.bounding_box = system.bounding_box.translated(0.0, top);
    }

    let total_width = systems
        .iter()
        .map(|s| s.bounding_box.width)
        .fold(0.0, f64::max);
    let layout = GlobalLayout {
        total_width: round2(total_width),
        total_height: stacked_height(&heights, config.system_spacing),
        units_per_space: round2(config.units_per_space),
        systems,
    };
    log::debug!(
        "layout: {} measures, {} systems, {} glyphs in {} runs",
        grid.measures.len(),
        layout.systems.len(),
        layout.glyph_count(),
        layout.run_count()
    );
    Ok(finish(layout, warnings))
}

fn finish(layout: GlobalLayout, warnings: Vec<LayoutWarning>) -> LayoutResult {
    for warning in &warnings {
        log::warn!("{warning}");
    }
    LayoutResult { layout, warnings }
}

// ═══════════════════════════════════════════════════════════════════════
// Measure preparation
// ═══════════════════════════════════════════════════════════════════════

/// A measure with its vertical placements and horizontal spacing resolved.
struct PreparedMeasure<'g> {
    measure: &'g GridMeasure,
    header: HeaderPlan,
    /// Per column, per entry; `None` for rests
    placements: Vec<Vec<Option<PitchPlacement>>>,
    spacing: MeasureSpacing,
    /// Per column: distance from the notehead back to an inline clef
    clef_offsets: Vec<Option<f64>>,
    /// Width after the header
    content_width: f64,
    width: f64,
    /// Last notehead of the measure, seen from the measure's end
    tail: Option<PreviousHead>,
}

fn prepare_measure<'g>(
    ctx: &GlyphContext<'_>,
    measure: &'g GridMeasure,
    config: &LayoutConfig,
    previous: Option<PreviousHead>,
) -> Result<PreparedMeasure<'g>> {
    let ups = ctx.units_per_space;
    let header = plan_header(ctx, measure)?;
    let mut states = vec![AccidentalState::new(); measure.states.len()];
    let mut previous = previous.map(|p| p.further(header.width));

    let mut placements = Vec::with_capacity(measure.columns.len());
    let mut specs = Vec::with_capacity(measure.columns.len());
    let mut clef_offsets = Vec::with_capacity(measure.columns.len());
    for (ci, column) in measure.columns.iter().enumerate() {
        let mut lead = LeadIn::default();
        for inline in measure.clefs_before(ci) {
            let advance = ctx.metrics.glyph(clef_glyph_name(inline.clef))?.advance(ups);
            lead.clef_advance = Some(lead.clef_advance.map_or(advance, |a| a.max(advance)));
        }

        let mut head_width: Option<f64> = None;
        let mut column_placements = Vec::with_capacity(column.entries.len());
        for entry in &column.entries {
            let placement = match entry.pitch {
                Some(pitch) => {
                    let clef = measure.clef_at(entry.slot, ci);
                    let key = measure.states[entry.slot].key;
                    let placement = position_pitch(pitch, clef, key, &mut states[entry.slot]);
                    if let Some(accidental) = placement.accidental {
                        let advance = ctx.metrics.glyph(accidental.glyph_name())?.advance(ups);
                        lead.accidental_advance =
                            Some(lead.accidental_advance.map_or(advance, |a| a.max(advance)));
                    }
                    let head = ctx.metrics.glyph(notehead_name(entry.duration))?.advance(ups);
                    head_width = Some(head_width.map_or(head, |w| w.max(head)));
                    Some(placement)
                }
                None => None,
            };
            column_placements.push(placement);
        }

        let lead_in = lead.width(previous, ups);
        let width = column_width(column.shortest, &config.spacing);
        previous = match head_width {
            Some(width_of_head) => Some(PreviousHead {
                room: width,
                width: width_of_head,
            }),
            None => previous.map(|p| p.further(lead_in + width)),
        };
        placements.push(column_placements);
        clef_offsets.push(lead.clef_offset(ups));
        specs.push(ColumnSpec {
            duration: column.shortest,
            lead_in,
        });
    }

    let spacing = space_columns(&specs, &config.spacing);
    let content_width = if measure.columns.is_empty() {
        let width = empty_measure_width(measure.time, &config.spacing);
        previous = previous.map(|p| p.further(width));
        width
    } else {
        spacing.total_width
    };
    Ok(PreparedMeasure {
        measure,
        header,
        placements,
        spacing,
        clef_offsets,
        content_width,
        width: round2(header.width + content_width),
        tail: previous,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// System assembly
// ═══════════════════════════════════════════════════════════════════════

/// Build one system in its own frame (origin at its bounding box's
/// top-left corner) and report the collisions found in it.
fn assemble_system(
    ctx: &GlyphContext<'_>,
    score: &CompiledScore,
    grid: &MeasureGrid,
    prepared: &[PreparedMeasure<'_>],
    brk: &SystemBreak,
    tops: &[f64],
) -> Result<(System, Vec<LayoutWarning>)> {
    let ups = ctx.units_per_space;
    let slot_count = grid.slots.len();
    let last_measure = prepared.len() - 1;

    let mut structural: Vec<Vec<_>> = vec![Vec::new(); slot_count];
    let mut emitted: Vec<Vec<EmittedGlyph>> = vec![Vec::new(); slot_count];
    let mut bars: Vec<Vec<_>> = vec![Vec::new(); slot_count];

    let mut measure_x = 0.0;
    for mi in brk.measures.clone() {
        let pm = &prepared[mi];
        let measure = pm.measure;
        for slot in 0..slot_count {
            structural[slot].extend(emit_header(
                ctx, score, &pm.header, measure, slot, measure_x, tops[slot],
            )?);
        }

        let content_x = measure_x + pm.header.width;
        for (ci, column) in measure.columns.iter().enumerate() {
            let x = round2(content_x + pm.spacing.offsets[ci]);
            if let Some(offset) = pm.clef_offsets[ci] {
                for inline in measure.clefs_before(ci) {
                    structural[inline.slot].push(emit_inline_clef(
                        ctx,
                        score,
                        inline,
                        x - offset,
                        tops[inline.slot],
                    )?);
                }
            }
            for (entry, placement) in column.entries.iter().zip(&pm.placements[ci]) {
                let source = source_reference(score, entry.source);
                let out = &mut emitted[entry.slot];
                match placement {
                    Some(p) => emit_note(
                        ctx,
                        x,
                        tops[entry.slot],
                        entry.duration,
                        p,
                        source,
                        entry.source.voice,
                        out,
                    )?,
                    None => emit_rest(
                        ctx,
                        x,
                        tops[entry.slot],
                        entry.duration,
                        source,
                        entry.source.voice,
                        out,
                    )?,
                }
            }
        }

        let range = measure.tick_range;
        for rest in &measure.free_rests {
            let fraction = (rest.tick - range.start_tick) as f64 / range.len().max(1) as f64;
            let x = round2(content_x + fraction * pm.content_width);
            emit_rest(
                ctx,
                x,
                tops[rest.slot],
                rest.duration,
                source_reference(score, rest.source),
                rest.source.voice,
                &mut emitted[rest.slot],
            )?;
        }

        measure_x = round2(measure_x + pm.width);
        let bar_type = if mi == last_measure {
            BarType::Final
        } else {
            BarType::Single
        };
        for slot in 0..slot_count {
            bars[slot].push(bar_line(measure_x, tops[slot], ups, bar_type));
        }
    }

    let candidates: Vec<_> = emitted
        .iter()
        .flatten()
        .filter(|e| matches!(e.kind, GlyphKind::Notehead | GlyphKind::Accidental))
        .map(|e| &e.glyph)
        .collect();
    let collisions = detect_collisions(&candidates, brk.index);

    let mut staves: Vec<Staff> = Vec::with_capacity(slot_count);
    for ((glyphs, structural_glyphs), (bar_lines, &top)) in emitted
        .into_iter()
        .zip(structural)
        .zip(bars.into_iter().zip(tops))
    {
        let glyph_runs = batch_glyphs(glyphs.into_iter().map(|e| (e.glyph, e.style)).collect());
        let mut staff = Staff {
            staff_lines: staff_lines(top, 0.0, brk.width, ups),
            structural_glyphs,
            glyph_runs,
            bar_lines,
            bounding_box: BoundingBox::new(0.0, 0.0, 0.0, 0.0),
        };
        staff.bounding_box = staff_bounds(&staff);
        staves.push(staff);
    }

    // Group staves per instrument, then move into the system frame.
    let mut groups: Vec<StaffGroup> = Vec::with_capacity(score.instruments.len());
    let mut remaining = staves.into_iter();
    for instrument in &score.instruments {
        let staves: Vec<Staff> = remaining.by_ref().take(instrument.staves.len()).collect();
        let bounding_box = BoundingBox::union_all(staves.iter().map(|s| &s.bounding_box))
            .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        groups.push(StaffGroup {
            instrument_id: instrument.id.clone(),
            bracket_type: bracket_type(instrument),
            bounding_box,
            staves,
        });
    }

    let content = BoundingBox::union_all(groups.iter().map(|g| &g.bounding_box))
        .unwrap_or(BoundingBox::new(0.0, 0.0, brk.width, 0.0));
    let (dx, dy) = (-content.x, -content.y);
    for group in groups.iter_mut() {
        for staff in group.staves.iter_mut() {
            translate_staff(staff, dx, dy);
        }
        group.bounding_box = group.bounding_box.translated(dx, dy);
    }

    log::debug!(
        "system {}: measures {:?}, width {}, {} collisions",
        brk.index,
        brk.measures,
        content.width,
        collisions.len()
    );

    let system = System {
        index: brk.index,
        bounding_box: BoundingBox::new(0.0, 0.0, content.width, content.height),
        tick_range: brk.tick_range,
        staff_groups: groups,
    };
    Ok((system, collisions))
}

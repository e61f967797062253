//! Glyph emission for notes and rests.
//!
//! Coordinates produced here are in the provisional system frame (x from
//! the system's left edge, y from the first staff's top line); the
//! orchestrator moves them into the final system-relative frame.

use crate::error::Result;
use crate::geometry::{BoundingBox, Color, Point};
use crate::metrics::{FontMetrics, GlyphMetrics};
use crate::model::{CompiledScore, TICKS_PER_WHOLE};

use super::batcher::DrawStyle;
use super::constants::*;
use super::measures::EventRef;
use super::positioner::{position_to_y, PitchPlacement};
use super::types::{Glyph, SourceReference};

/// What an emitted glyph depicts. Only noteheads and accidentals take
/// part in collision detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Notehead,
    Accidental,
    LedgerLine,
    Rest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmittedGlyph {
    pub glyph: Glyph,
    pub style: DrawStyle,
    pub kind: GlyphKind,
}

/// Shared inputs of every emission call within one layout pass.
pub struct GlyphContext<'a> {
    pub metrics: &'a FontMetrics,
    pub units_per_space: f64,
    pub voice_colors: &'a [Color],
}

impl<'a> GlyphContext<'a> {
    /// Draw style of a voice: the font at one em, black unless voice
    /// colours are configured.
    pub fn voice_style(&self, voice: usize) -> DrawStyle {
        let color = if self.voice_colors.is_empty() {
            Color::BLACK
        } else {
            self.voice_colors[voice % self.voice_colors.len()]
        };
        DrawStyle {
            font_family: self.metrics.family().to_string(),
            font_size: EM_IN_SPACES * self.units_per_space,
            color,
            opacity: DEFAULT_OPACITY,
        }
    }

    /// Build a glyph from its metrics at `origin`.
    pub fn glyph(
        &self,
        metrics: &GlyphMetrics,
        origin: Point,
        source: Option<SourceReference>,
    ) -> Glyph {
        Glyph {
            position: origin,
            bounding_box: metrics.bounding_box(origin, self.units_per_space),
            codepoint: metrics.codepoint,
            source_reference: source,
        }
    }
}

/// Source reference of an event, resolving the instrument id.
pub fn source_reference(score: &CompiledScore, at: EventRef) -> SourceReference {
    SourceReference {
        instrument_id: score
            .instruments
            .get(at.instrument)
            .map(|i| i.id.clone())
            .unwrap_or_default(),
        staff_index: at.staff,
        voice_index: at.voice,
        event_index: at.event,
    }
}

pub fn notehead_name(duration: u32) -> &'static str {
    if duration >= TICKS_PER_WHOLE {
        NOTEHEAD_WHOLE
    } else if duration >= TICKS_PER_WHOLE / 2 {
        NOTEHEAD_HALF
    } else {
        NOTEHEAD_BLACK
    }
}

pub fn rest_name(duration: u32) -> &'static str {
    match duration {
        d if d >= TICKS_PER_WHOLE => REST_WHOLE,
        d if d >= TICKS_PER_WHOLE / 2 => REST_HALF,
        d if d >= TICKS_PER_WHOLE / 4 => REST_QUARTER,
        d if d >= TICKS_PER_WHOLE / 8 => REST_8TH,
        d if d >= TICKS_PER_WHOLE / 16 => REST_16TH,
        _ => REST_32ND,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Emission
// ═══════════════════════════════════════════════════════════════════════

/// Emit one note: ledger lines, then its accidental, then the notehead.
///
/// `x` is the notehead origin; the accidental sits to its left inside the
/// column's lead-in.
#[allow(clippy::too_many_arguments)]
pub fn emit_note(
    ctx: &GlyphContext<'_>,
    x: f64,
    staff_top: f64,
    duration: u32,
    placement: &PitchPlacement,
    source: SourceReference,
    voice: usize,
    out: &mut Vec<EmittedGlyph>,
) -> Result<()> {
    let ups = ctx.units_per_space;
    let style = ctx.voice_style(voice);
    let y = position_to_y(placement.staff_position, staff_top, ups);

    let mut ledger_boxes = Vec::with_capacity(placement.ledger_lines.len());
    if !placement.ledger_lines.is_empty() {
        let ledger = ctx.metrics.glyph(LEDGER_LINE)?;
        for &position in &placement.ledger_lines {
            let origin = Point::new(x, position_to_y(position, staff_top, ups));
            let glyph = ctx.glyph(ledger, origin, Some(source.clone()));
            ledger_boxes.push(glyph.bounding_box);
            out.push(EmittedGlyph {
                glyph,
                style: style.clone(),
                kind: GlyphKind::LedgerLine,
            });
        }
    }

    if let Some(accidental) = placement.accidental {
        let metrics = ctx.metrics.glyph(accidental.glyph_name())?;
        let origin = Point::new(
            x - metrics.advance(ups) - ACCIDENTAL_NOTEHEAD_GAP * ups,
            y,
        );
        out.push(EmittedGlyph {
            glyph: ctx.glyph(metrics, origin, Some(source.clone())),
            style: style.clone(),
            kind: GlyphKind::Accidental,
        });
    }

    let head = ctx.metrics.glyph(notehead_name(duration))?;
    let mut glyph = ctx.glyph(head, Point::new(x, y), Some(source));
    if let Some(extent) = BoundingBox::union_all(ledger_boxes.iter()) {
        glyph.bounding_box = glyph.bounding_box.union(&extent);
    }
    out.push(EmittedGlyph {
        glyph,
        style,
        kind: GlyphKind::Notehead,
    });
    Ok(())
}

/// Emit a rest on the middle line (a whole rest hangs from the fourth).
pub fn emit_rest(
    ctx: &GlyphContext<'_>,
    x: f64,
    staff_top: f64,
    duration: u32,
    source: SourceReference,
    voice: usize,
    out: &mut Vec<EmittedGlyph>,
) -> Result<()> {
    let name = rest_name(duration);
    let position = if name == REST_WHOLE {
        WHOLE_REST_POSITION
    } else {
        0
    };
    let metrics = ctx.metrics.glyph(name)?;
    let origin = Point::new(x, position_to_y(position, staff_top, ctx.units_per_space));
    out.push(EmittedGlyph {
        glyph: ctx.glyph(metrics, origin, Some(source)),
        style: ctx.voice_style(voice),
        kind: GlyphKind::Rest,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::positioner::{position_pitch, Accidental, AccidentalState};
    use crate::model::{Clef, KeySignature};

    fn ctx(colors: &[Color]) -> GlyphContext<'_> {
        GlyphContext {
            metrics: FontMetrics::embedded().unwrap(),
            units_per_space: 10.0,
            voice_colors: colors,
        }
    }

    fn source() -> SourceReference {
        SourceReference {
            instrument_id: "p".into(),
            staff_index: 0,
            voice_index: 0,
            event_index: 3,
        }
    }

    #[test]
    fn notehead_by_duration() {
        assert_eq!(notehead_name(3840), NOTEHEAD_WHOLE);
        assert_eq!(notehead_name(2880), NOTEHEAD_HALF);
        assert_eq!(notehead_name(1920), NOTEHEAD_HALF);
        assert_eq!(notehead_name(960), NOTEHEAD_BLACK);
        assert_eq!(notehead_name(120), NOTEHEAD_BLACK);
    }

    #[test]
    fn rest_by_duration() {
        assert_eq!(rest_name(3840), REST_WHOLE);
        assert_eq!(rest_name(1920), REST_HALF);
        assert_eq!(rest_name(1440), REST_QUARTER);
        assert_eq!(rest_name(480), REST_8TH);
        assert_eq!(rest_name(240), REST_16TH);
        assert_eq!(rest_name(120), REST_32ND);
    }

    #[test]
    fn plain_note_emits_one_notehead() {
        let ctx = ctx(&[]);
        let mut state = AccidentalState::new();
        let placement = position_pitch(72, Clef::Treble, KeySignature::default(), &mut state);
        let mut out = Vec::new();
        emit_note(&ctx, 50.0, 0.0, 960, &placement, source(), 0, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        let head = &out[0];
        assert_eq!(head.kind, GlyphKind::Notehead);
        assert_eq!(head.glyph.codepoint, 0xE0A4);
        // C5 is the third space: one step above the middle line.
        assert_eq!(head.glyph.position, Point::new(50.0, 15.0));
        assert_eq!(head.style.font_size, 40.0);
        assert_eq!(head.style.color, Color::BLACK);
        assert_eq!(head.glyph.source_reference, Some(source()));
    }

    #[test]
    fn ledger_lines_and_accidental_come_before_the_notehead() {
        let ctx = ctx(&[]);
        let mut state = AccidentalState::new();
        // C#4 below the treble staff.
        let placement = position_pitch(61, Clef::Treble, KeySignature::default(), &mut state);
        assert_eq!(placement.accidental, Some(Accidental::Sharp));
        let mut out = Vec::new();
        emit_note(&ctx, 50.0, 0.0, 960, &placement, source(), 0, &mut out).unwrap();
        let kinds: Vec<GlyphKind> = out.iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![GlyphKind::LedgerLine, GlyphKind::Accidental, GlyphKind::Notehead]
        );

        let accidental = &out[1].glyph;
        assert!(accidental.bounding_box.right() <= 50.0);

        // The notehead box reaches out to the ledger line's extent.
        let ledger = &out[0].glyph.bounding_box;
        let head = &out[2].glyph.bounding_box;
        assert!(head.x <= ledger.x);
        assert!(head.right() >= ledger.right());
    }

    #[test]
    fn voice_colors_cycle() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let colors = [red, blue];
        let ctx = ctx(&colors);
        assert_eq!(ctx.voice_style(0).color, red);
        assert_eq!(ctx.voice_style(1).color, blue);
        assert_eq!(ctx.voice_style(2).color, red);
    }

    #[test]
    fn whole_rest_hangs_from_the_fourth_line() {
        let ctx = ctx(&[]);
        let mut out = Vec::new();
        emit_rest(&ctx, 10.0, 0.0, 3840, source(), 0, &mut out).unwrap();
        emit_rest(&ctx, 20.0, 0.0, 960, source(), 0, &mut out).unwrap();
        assert_eq!(out[0].glyph.position.y, 10.0);
        assert_eq!(out[1].glyph.position.y, 20.0);
        assert!(out.iter().all(|g| g.kind == GlyphKind::Rest));
    }
}

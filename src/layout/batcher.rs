//! Run batching: consecutive glyphs with the same draw style share a run.

use crate::geometry::Color;

use super::types::{Glyph, GlyphRun};

/// Everything that must match for two glyphs to share a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawStyle {
    pub font_family: String,
    pub font_size: f64,
    pub color: Color,
    pub opacity: f64,
}

/// Group glyphs into runs in one pass, keeping their order.
pub fn batch_glyphs(glyphs: Vec<(Glyph, DrawStyle)>) -> Vec<GlyphRun> {
    let mut runs: Vec<GlyphRun> = Vec::new();
    let mut current: Option<DrawStyle> = None;

    for (glyph, style) in glyphs {
        if current.as_ref() == Some(&style) {
            if let Some(run) = runs.last_mut() {
                run.glyphs.push(glyph);
                continue;
            }
        }
        runs.push(GlyphRun {
            glyphs: vec![glyph],
            font_family: style.font_family.clone(),
            font_size: style.font_size,
            color: style.color,
            opacity: style.opacity,
        });
        current = Some(style);
    }
    runs
}

//! Overlap detection between noteheads and accidentals of different
//! events. Overlaps are reported, never resolved.

use crate::error::LayoutWarning;

use super::types::Glyph;

/// Report every overlapping pair of glyphs that belong to different
/// events. Glyphs without a source reference are ignored.
///
/// Sweeps the glyphs in x order so only horizontally overlapping
/// candidates are compared.
pub fn detect_collisions(glyphs: &[&Glyph], system_index: usize) -> Vec<LayoutWarning> {
    let mut order: Vec<usize> = (0..glyphs.len())
        .filter(|&i| glyphs[i].source_reference.is_some())
        .collect();
    order.sort_by(|&a, &b| {
        glyphs[a]
            .bounding_box
            .x
            .total_cmp(&glyphs[b].bounding_box.x)
            .then(a.cmp(&b))
    });

    let mut warnings = Vec::new();
    let mut active: Vec<usize> = Vec::new();
    for &i in &order {
        let current = glyphs[i];
        active.retain(|&j| glyphs[j].bounding_box.right() > current.bounding_box.x);
        for &j in &active {
            let other = glyphs[j];
            if other.source_reference == current.source_reference {
                continue;
            }
            if other.bounding_box.intersects(&current.bounding_box) {
                if let (Some(first), Some(second)) =
                    (&other.source_reference, &current.source_reference)
                {
                    warnings.push(LayoutWarning::SpacingCollision {
                        first: first.clone(),
                        second: second.clone(),
                        system_index,
                    });
                }
            }
        }
        active.push(i);
    }
    warnings
}

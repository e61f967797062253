//! SMuFL font metrics for the embedded notation font.
//!
//! The metrics file follows the SMuFL font-metadata layout (`glyphBBoxes`,
//! `glyphAdvanceWidths`) plus a `glyphCodepoints` table. All values are in
//! staff spaces with the y axis pointing up; conversion to logical units
//! (y down) happens in [`GlyphMetrics::bounding_box`].

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::error::{LayoutError, Result};
use crate::geometry::{round2, BoundingBox, Point};

const EMBEDDED_METRICS: &str = include_str!("../assets/bravura_metrics.json");

static EMBEDDED: OnceCell<FontMetrics> = OnceCell::new();

// ═══════════════════════════════════════════════════════════════════════
// Raw metadata (as stored in the JSON asset)
// ═══════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    font_name: String,
    glyph_codepoints: BTreeMap<String, String>,
    #[serde(default)]
    glyph_advance_widths: BTreeMap<String, f64>,
    #[serde(rename = "glyphBBoxes")]
    glyph_bboxes: BTreeMap<String, RawBBox>,
}

#[derive(Deserialize)]
struct RawBBox {
    #[serde(rename = "bBoxNE")]
    ne: [f64; 2],
    #[serde(rename = "bBoxSW")]
    sw: [f64; 2],
}

fn parse_codepoint(name: &str, text: &str) -> Result<u32> {
    let hex = text
        .strip_prefix("U+")
        .ok_or_else(|| LayoutError::MetricsLoad(format!("{name}: bad codepoint '{text}'")))?;
    u32::from_str_radix(hex, 16)
        .map_err(|e| LayoutError::MetricsLoad(format!("{name}: bad codepoint '{text}': {e}")))
}

// ═══════════════════════════════════════════════════════════════════════
// Resolved metrics
// ═══════════════════════════════════════════════════════════════════════

/// Metrics of one glyph, in staff spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMetrics {
    pub name: String,
    pub codepoint: u32,
    pub advance_width: f64,
    /// North-east corner of the ink box relative to the glyph origin.
    pub bbox_ne: [f64; 2],
    /// South-west corner of the ink box relative to the glyph origin.
    pub bbox_sw: [f64; 2],
}

impl GlyphMetrics {
    /// Advance width in logical units, rounded.
    pub fn advance(&self, units_per_space: f64) -> f64 {
        round2(self.advance_width * units_per_space)
    }

    /// Ink width in logical units.
    pub fn ink_width(&self, units_per_space: f64) -> f64 {
        round2((self.bbox_ne[0] - self.bbox_sw[0]) * units_per_space)
    }

    /// Distance from the top of the ink box down to the baseline.
    pub fn baseline_offset(&self, units_per_space: f64) -> f64 {
        round2(self.bbox_ne[1] * units_per_space)
    }

    /// Ink box of the glyph drawn with its origin at `origin` (y down).
    pub fn bounding_box(&self, origin: Point, units_per_space: f64) -> BoundingBox {
        BoundingBox::new(
            origin.x + self.bbox_sw[0] * units_per_space,
            origin.y - self.bbox_ne[1] * units_per_space,
            (self.bbox_ne[0] - self.bbox_sw[0]) * units_per_space,
            (self.bbox_ne[1] - self.bbox_sw[1]) * units_per_space,
        )
    }
}

/// Immutable glyph table for one notation font.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    family: String,
    glyphs: BTreeMap<String, GlyphMetrics>,
    names_by_codepoint: BTreeMap<u32, String>,
}

impl FontMetrics {
    /// Parse metrics from SMuFL-style metadata JSON.
    ///
    /// Every glyph listed in `glyphCodepoints` must have a bounding box;
    /// a missing advance width falls back to the ink width.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawMetadata = serde_json::from_str(json)
            .map_err(|e| LayoutError::MetricsLoad(format!("metadata JSON: {e}")))?;

        let mut glyphs = BTreeMap::new();
        let mut names_by_codepoint = BTreeMap::new();
        for (name, cp_text) in &raw.glyph_codepoints {
            let codepoint = parse_codepoint(name, cp_text)?;
            let bbox = raw
                .glyph_bboxes
                .get(name)
                .ok_or_else(|| LayoutError::MetricsLoad(format!("{name}: no bounding box")))?;
            let advance_width = raw
                .glyph_advance_widths
                .get(name)
                .copied()
                .unwrap_or(bbox.ne[0] - bbox.sw[0]);

            if names_by_codepoint.insert(codepoint, name.clone()).is_some() {
                return Err(LayoutError::MetricsLoad(format!(
                    "codepoint {cp_text} assigned twice"
                )));
            }
            glyphs.insert(
                name.clone(),
                GlyphMetrics {
                    name: name.clone(),
                    codepoint,
                    advance_width,
                    bbox_ne: bbox.ne,
                    bbox_sw: bbox.sw,
                },
            );
        }

        log::debug!(
            "loaded {} glyph metrics for font '{}'",
            glyphs.len(),
            raw.font_name
        );

        Ok(Self {
            family: raw.font_name,
            glyphs,
            names_by_codepoint,
        })
    }

    /// The embedded Bravura subset, parsed on first use.
    ///
    /// If parsing fails nothing is cached and the error is returned.
    pub fn embedded() -> Result<&'static FontMetrics> {
        EMBEDDED.get_or_try_init(|| FontMetrics::from_json(EMBEDDED_METRICS))
    }

    /// Font family name used for every glyph run.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    /// Look up a glyph by SMuFL name.
    pub fn glyph(&self, name: &str) -> Result<&GlyphMetrics> {
        self.glyphs
            .get(name)
            .ok_or_else(|| LayoutError::UnresolvableReference {
                glyph: name.to_string(),
            })
    }

    /// Look up a glyph by codepoint.
    pub fn glyph_by_codepoint(&self, codepoint: u32) -> Result<&GlyphMetrics> {
        self.names_by_codepoint
            .get(&codepoint)
            .and_then(|name| self.glyphs.get(name))
            .ok_or_else(|| LayoutError::UnresolvableReference {
                glyph: format!("U+{codepoint:04X}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_metrics_load() {
        let metrics = FontMetrics::embedded().unwrap();
        assert_eq!(metrics.family(), "Bravura");
        assert!(metrics.len() >= 26, "expected the full subset, got {}", metrics.len());

        let black = metrics.glyph("noteheadBlack").unwrap();
        assert_eq!(black.codepoint, 0xE0A4);
        assert!(black.advance_width > 0.0);
    }

    #[test]
    fn embedded_is_shared() {
        let a = FontMetrics::embedded().unwrap() as *const FontMetrics;
        let b = FontMetrics::embedded().unwrap() as *const FontMetrics;
        assert_eq!(a, b);
    }

    #[test]
    fn codepoint_lookup_matches_name_lookup() {
        let metrics = FontMetrics::embedded().unwrap();
        let by_cp = metrics.glyph_by_codepoint(0xE050).unwrap();
        assert_eq!(by_cp.name, "gClef");
        for digit in 0..10u32 {
            let g = metrics.glyph_by_codepoint(0xE080 + digit).unwrap();
            assert_eq!(g.name, format!("timeSig{digit}"));
        }
    }

    #[test]
    fn missing_glyph_is_an_unresolvable_reference() {
        let metrics = FontMetrics::embedded().unwrap();
        match metrics.glyph("noteheadTriangle") {
            Err(LayoutError::UnresolvableReference { glyph }) => {
                assert_eq!(glyph, "noteheadTriangle")
            }
            other => panic!("expected unresolvable reference, got {other:?}"),
        }
        assert!(metrics.glyph_by_codepoint(0x41).is_err());
    }

    #[test]
    fn bounding_box_flips_the_y_axis() {
        let metrics = FontMetrics::embedded().unwrap();
        let black = metrics.glyph("noteheadBlack").unwrap();
        let bbox = black.bounding_box(Point::new(100.0, 50.0), 10.0);
        assert_eq!(bbox, BoundingBox::new(100.0, 45.0, 11.8, 10.0));
        assert_eq!(black.baseline_offset(10.0), 5.0);
        assert_eq!(black.advance(10.0), 11.8);
    }

    #[test]
    fn malformed_metadata_is_a_load_error() {
        assert!(matches!(
            FontMetrics::from_json("not json"),
            Err(LayoutError::MetricsLoad(_))
        ));

        let missing_bbox = r#"{
            "fontName": "Test",
            "glyphCodepoints": {"noteheadBlack": "U+E0A4"},
            "glyphBBoxes": {}
        }"#;
        assert!(matches!(
            FontMetrics::from_json(missing_bbox),
            Err(LayoutError::MetricsLoad(_))
        ));

        let bad_codepoint = r#"{
            "fontName": "Test",
            "glyphCodepoints": {"noteheadBlack": "E0A4"},
            "glyphBBoxes": {"noteheadBlack": {"bBoxNE": [1, 0.5], "bBoxSW": [0, -0.5]}}
        }"#;
        assert!(FontMetrics::from_json(bad_codepoint).is_err());
    }

    #[test]
    fn advance_falls_back_to_ink_width() {
        let json = r#"{
            "fontName": "Test",
            "glyphCodepoints": {"noteheadBlack": "U+E0A4"},
            "glyphBBoxes": {"noteheadBlack": {"bBoxNE": [1.5, 0.5], "bBoxSW": [0.25, -0.5]}}
        }"#;
        let metrics = FontMetrics::from_json(json).unwrap();
        assert_eq!(metrics.glyph("noteheadBlack").unwrap().advance_width, 1.25);
    }
}

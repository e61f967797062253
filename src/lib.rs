//! scorelayout — deterministic layout engine for compiled musical scores.
//!
//! Takes a compiled score (timed events at 960 ticks per quarter note) and
//! produces a hierarchical spatial model: systems, staff groups, staves,
//! staff lines, bar lines and batched SMuFL glyph runs, all in logical
//! units. Identical input always serializes to identical bytes.
//!
//! # Example
//! ```no_run
//! use scorelayout::{compute_layout, CompiledScore, LayoutConfig};
//!
//! let json = std::fs::read_to_string("score.json").unwrap();
//! let score = CompiledScore::from_json(&json).unwrap();
//! let result = compute_layout(&score, &LayoutConfig::default()).unwrap();
//! println!("Systems: {}", result.layout.systems.len());
//! println!("Warnings: {}", result.warnings.len());
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod metrics;
pub mod model;

#[cfg(target_os = "android")]
pub mod android;

pub use config::{LayoutConfig, SpacingConfig};
pub use error::{LayoutError, LayoutWarning, Result};
pub use geometry::{round2, BoundingBox, Color, Point, TickRange};
pub use layout::types::{
    BarLine, BarType, GlobalLayout, Glyph, GlyphRun, SourceReference, StaffGroup, StaffLine,
    System,
};
pub use layout::{compute_layout, compute_layout_with_metrics, LayoutResult};
pub use metrics::{FontMetrics, GlyphMetrics};
pub use model::{
    BracketType, Clef, CompiledScore, Event, EventKind, Instrument, KeySignature, TimeSignature,
    Voice, TICKS_PER_QUARTER, TICKS_PER_WHOLE,
};

/// Lay out a score given as JSON and return the canonical layout JSON.
///
/// `config_json` may be `None` (or an empty object) for the defaults.
pub fn compute_layout_json(score_json: &str, config_json: Option<&str>) -> Result<String> {
    let score = CompiledScore::from_json(score_json)?;
    let config: LayoutConfig = match config_json {
        Some(text) if !text.trim().is_empty() => serde_json::from_str(text)?,
        _ => LayoutConfig::default(),
    };
    compute_layout(&score, &config)?.layout.to_canonical_json()
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI — for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Compute a layout from JSON and return the canonical layout JSON as a C
/// string. The caller must free it with `scorelayout_free_string`.
///
/// Returns null on any error; the error is logged.
///
/// # Safety
/// `score_json` must be a valid null-terminated UTF-8 C string.
/// `config_json` may be null.
#[no_mangle]
pub unsafe extern "C" fn scorelayout_compute_layout(
    score_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    if score_json.is_null() {
        log::error!("scorelayout_compute_layout: score_json is null");
        return std::ptr::null_mut();
    }
    let score = match unsafe { CStr::from_ptr(score_json) }.to_str() {
        Ok(s) => s,
        Err(e) => {
            log::error!("scorelayout_compute_layout: score_json is not UTF-8: {e}");
            return std::ptr::null_mut();
        }
    };
    let config = if config_json.is_null() {
        None
    } else {
        match unsafe { CStr::from_ptr(config_json) }.to_str() {
            Ok(s) => Some(s),
            Err(e) => {
                log::error!("scorelayout_compute_layout: config_json is not UTF-8: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    match compute_layout_json(score, config) {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(e) => {
            log::error!("scorelayout_compute_layout: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by scorelayout functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a scorelayout function, or null.
#[no_mangle]
pub unsafe extern "C" fn scorelayout_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

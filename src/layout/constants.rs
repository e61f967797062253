//! Shared constants for the layout engine. Distances are in staff spaces
//! unless the name says otherwise; multiply by `unitsPerSpace`.

// ── Staff ───────────────────────────────────────────────────────────
pub(super) const STAFF_LINE_COUNT: usize = 5;
pub(super) const STAFF_HEIGHT_SPACES: f64 = 4.0; // 5 lines, 4 spaces
pub(super) const TOP_LINE_POSITION: i32 = 4; // staff steps above the middle line
pub(super) const FIRST_LEDGER_POSITION: i32 = 6;

// ── Draw style ──────────────────────────────────────────────────────
pub(super) const EM_IN_SPACES: f64 = 4.0; // SMuFL: 1 em = 4 staff spaces
pub(super) const DEFAULT_OPACITY: f64 = 1.0;

// ── Horizontal padding ──────────────────────────────────────────────
pub(super) const ACCIDENTAL_LEAD_PAD: f64 = 1.5; // added to the accidental advance
pub(super) const ACCIDENTAL_NOTEHEAD_GAP: f64 = 0.5; // accidental to its own notehead
pub(super) const INLINE_CLEF_GAP: f64 = 1.0;
pub(super) const HEADER_LEFT_PAD: f64 = 0.5;
pub(super) const HEADER_SEGMENT_GAP: f64 = 1.0; // after clef, key and time segments
pub(super) const KEY_ACCIDENTAL_GAP: f64 = 0.2;

// ── Structural anchors (staff steps above the middle line) ─────────
pub(super) const TIME_NUMERATOR_POSITION: i32 = 2;
pub(super) const TIME_DENOMINATOR_POSITION: i32 = -2;
pub(super) const WHOLE_REST_POSITION: i32 = 2; // hangs from the fourth line

// ── Glyph names (SMuFL) ─────────────────────────────────────────────
pub(super) const NOTEHEAD_WHOLE: &str = "noteheadWhole";
pub(super) const NOTEHEAD_HALF: &str = "noteheadHalf";
pub(super) const NOTEHEAD_BLACK: &str = "noteheadBlack";
pub(super) const LEDGER_LINE: &str = "legerLine";
pub(super) const ACCIDENTAL_SHARP: &str = "accidentalSharp";
pub(super) const ACCIDENTAL_FLAT: &str = "accidentalFlat";
pub(super) const ACCIDENTAL_NATURAL: &str = "accidentalNatural";
pub(super) const G_CLEF: &str = "gClef";
pub(super) const F_CLEF: &str = "fClef";
pub(super) const C_CLEF: &str = "cClef";
pub(super) const REST_WHOLE: &str = "restWhole";
pub(super) const REST_HALF: &str = "restHalf";
pub(super) const REST_QUARTER: &str = "restQuarter";
pub(super) const REST_8TH: &str = "rest8th";
pub(super) const REST_16TH: &str = "rest16th";
pub(super) const REST_32ND: &str = "rest32nd";
pub(super) const TIME_SIG_DIGITS: [&str; 10] = [
    "timeSig0", "timeSig1", "timeSig2", "timeSig3", "timeSig4", "timeSig5", "timeSig6",
    "timeSig7", "timeSig8", "timeSig9",
];

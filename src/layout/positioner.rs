//! Vertical positioning: pitch + clef → staff position.
//!
//! Staff positions count diatonic steps above the middle line; one step is
//! half a staff space, so the five lines sit at -4, -2, 0, 2 and 4.

use std::collections::BTreeMap;

use crate::model::{Clef, KeySignature};

use super::constants::*;

/// Letter names from C, indexed 0..7.
const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// Order in which sharps enter a key signature (F C G D A E B).
const SHARP_ORDER: [u8; 7] = [3, 0, 4, 1, 5, 2, 6];
/// Order in which flats enter a key signature (B E A D G C F).
const FLAT_ORDER: [u8; 7] = [6, 2, 5, 1, 4, 0, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Accidental {
    Sharp,
    Flat,
    Natural,
}

impl Accidental {
    pub(super) fn glyph_name(self) -> &'static str {
        match self {
            Accidental::Sharp => ACCIDENTAL_SHARP,
            Accidental::Flat => ACCIDENTAL_FLAT,
            Accidental::Natural => ACCIDENTAL_NATURAL,
        }
    }

    fn for_alteration(alteration: i8) -> Self {
        match alteration {
            a if a > 0 => Accidental::Sharp,
            a if a < 0 => Accidental::Flat,
            _ => Accidental::Natural,
        }
    }
}

/// A pitch spelled as letter + alteration + octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spelling {
    /// 0 = C … 6 = B
    pub letter: u8,
    /// -1 flat, 0 natural, +1 sharp
    pub alteration: i8,
    /// Scientific octave (middle C is C4)
    pub octave: i32,
}

impl Spelling {
    fn diatonic_index(&self) -> i32 {
        self.octave * 7 + self.letter as i32
    }
}

impl std::fmt::Display for Spelling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let acc = match self.alteration {
            1 => "#",
            -1 => "b",
            _ => "",
        };
        write!(f, "{}{}{}", LETTERS[self.letter as usize], acc, self.octave)
    }
}

/// Result of placing one note on a staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchPlacement {
    pub staff_position: i32,
    /// Positions of the ledger lines the note needs, nearest the staff first
    pub ledger_lines: Vec<i32>,
    pub accidental: Option<Accidental>,
}

/// Alterations in force within the current measure, per letter and octave.
#[derive(Debug, Clone, Default)]
pub struct AccidentalState {
    in_force: BTreeMap<(u8, i32), i8>,
}

impl AccidentalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every accidental; called at each measure start.
    pub fn reset(&mut self) {
        self.in_force.clear();
    }

    fn current(&self, spelling: &Spelling, key: KeySignature) -> i8 {
        self.in_force
            .get(&(spelling.letter, spelling.octave))
            .copied()
            .unwrap_or_else(|| key_alteration(spelling.letter, key))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Spelling and staff position
// ═══════════════════════════════════════════════════════════════════════

/// Alteration a key signature applies to a letter.
pub fn key_alteration(letter: u8, key: KeySignature) -> i8 {
    let count = key.fifths.unsigned_abs() as usize;
    if key.fifths > 0 && SHARP_ORDER[..count.min(7)].contains(&letter) {
        1
    } else if key.fifths < 0 && FLAT_ORDER[..count.min(7)].contains(&letter) {
        -1
    } else {
        0
    }
}

/// Spell a MIDI pitch. Black keys are sharps in sharp keys and C major,
/// flats in flat keys.
pub fn spell(pitch: u8, key: KeySignature) -> Spelling {
    let pc = pitch % 12;
    let octave = pitch as i32 / 12 - 1;
    let prefer_flats = key.fifths < 0;
    let (letter, alteration) = match pc {
        0 => (0, 0),
        1 if prefer_flats => (1, -1),
        1 => (0, 1),
        2 => (1, 0),
        3 if prefer_flats => (2, -1),
        3 => (1, 1),
        4 => (2, 0),
        5 => (3, 0),
        6 if prefer_flats => (4, -1),
        6 => (3, 1),
        7 => (4, 0),
        8 if prefer_flats => (5, -1),
        8 => (4, 1),
        9 => (5, 0),
        10 if prefer_flats => (6, -1),
        10 => (5, 1),
        _ => (6, 0),
    };
    Spelling {
        letter,
        alteration,
        octave,
    }
}

/// Pitch on the middle staff line for each clef.
pub fn middle_line_pitch(clef: Clef) -> u8 {
    match clef {
        Clef::Treble => 71, // B4
        Clef::Bass => 50,   // D3
        Clef::Alto => 60,   // C4
        Clef::Tenor => 57,  // A3
    }
}

fn middle_line_index(clef: Clef) -> i32 {
    spell(middle_line_pitch(clef), KeySignature::default()).diatonic_index()
}

/// Diatonic steps of `pitch` above the middle line of `clef`.
pub fn staff_position(pitch: u8, clef: Clef, key: KeySignature) -> i32 {
    spell(pitch, key).diatonic_index() - middle_line_index(clef)
}

/// Ledger lines needed for a note at `position`.
pub fn ledger_lines(position: i32) -> Vec<i32> {
    if position >= FIRST_LEDGER_POSITION {
        (FIRST_LEDGER_POSITION..=position).step_by(2).collect()
    } else if position <= -FIRST_LEDGER_POSITION {
        (position..=-FIRST_LEDGER_POSITION)
            .rev()
            .filter(|p| p % 2 == 0)
            .collect()
    } else {
        Vec::new()
    }
}

/// Place one note, updating the measure's accidental state.
pub fn position_pitch(
    pitch: u8,
    clef: Clef,
    key: KeySignature,
    state: &mut AccidentalState,
) -> PitchPlacement {
    let spelling = spell(pitch, key);
    let position = spelling.diatonic_index() - middle_line_index(clef);

    let accidental = if spelling.alteration != state.current(&spelling, key) {
        state
            .in_force
            .insert((spelling.letter, spelling.octave), spelling.alteration);
        Some(Accidental::for_alteration(spelling.alteration))
    } else {
        None
    };

    PitchPlacement {
        staff_position: position,
        ledger_lines: ledger_lines(position),
        accidental,
    }
}

/// Y coordinate of a staff position, given the y of the staff's top line.
pub fn position_to_y(position: i32, staff_top: f64, units_per_space: f64) -> f64 {
    let middle = staff_top + TOP_LINE_POSITION as f64 * units_per_space / 2.0;
    middle - position as f64 * units_per_space / 2.0
}

// ═══════════════════════════════════════════════════════════════════════
// Structural positions
// ═══════════════════════════════════════════════════════════════════════

const TREBLE_SHARPS: [i32; 7] = [4, 1, 5, 2, -1, 3, 0];
const TREBLE_FLATS: [i32; 7] = [0, 3, -1, 2, -2, 1, -3];
const TENOR_SHARPS: [i32; 7] = [-2, 2, -1, 3, 0, 4, 1];

/// Staff positions of the sharps of a key signature, in order of entry.
pub fn sharp_positions(clef: Clef) -> [i32; 7] {
    match clef {
        Clef::Treble => TREBLE_SHARPS,
        Clef::Bass => TREBLE_SHARPS.map(|p| p - 2),
        Clef::Alto => TREBLE_SHARPS.map(|p| p - 1),
        Clef::Tenor => TENOR_SHARPS,
    }
}

/// Staff positions of the flats of a key signature, in order of entry.
pub fn flat_positions(clef: Clef) -> [i32; 7] {
    match clef {
        Clef::Treble => TREBLE_FLATS,
        Clef::Bass => TREBLE_FLATS.map(|p| p - 2),
        Clef::Alto => TREBLE_FLATS.map(|p| p - 1),
        Clef::Tenor => TREBLE_FLATS.map(|p| p + 1),
    }
}

/// Accidentals to draw for a key signature change `from` → `to`.
///
/// A change to C major cancels the previous key with naturals; any other
/// change draws the new key's accidentals.
pub fn key_signature_accidentals(
    from: KeySignature,
    to: KeySignature,
    clef: Clef,
) -> Vec<(i32, Accidental)> {
    let (fifths, accidental) = if to.fifths == 0 {
        (from.fifths, Accidental::Natural)
    } else if to.fifths > 0 {
        (to.fifths, Accidental::Sharp)
    } else {
        (to.fifths, Accidental::Flat)
    };
    let count = (fifths.unsigned_abs() as usize).min(7);
    let positions = if fifths > 0 {
        sharp_positions(clef)
    } else {
        flat_positions(clef)
    };
    positions[..count]
        .iter()
        .map(|&p| (p, accidental))
        .collect()
}

/// Staff position of the clef glyph origin (the line the clef names).
pub fn clef_anchor_position(clef: Clef) -> i32 {
    match clef {
        Clef::Treble => -2, // G4 line
        Clef::Bass => 2,    // F3 line
        Clef::Alto => 0,    // C4 on the middle line
        Clef::Tenor => 2,   // C4 on the fourth line
    }
}

pub(super) fn clef_glyph_name(clef: Clef) -> &'static str {
    match clef {
        Clef::Treble => G_CLEF,
        Clef::Bass => F_CLEF,
        Clef::Alto | Clef::Tenor => C_CLEF,
    }
}

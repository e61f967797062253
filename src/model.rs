//! Input model: a compiled score.
//!
//! A compiled score is the already-resolved form of the domain model that
//! the layout engine consumes. Time is measured in integer ticks at
//! [`TICKS_PER_QUARTER`] resolution; pitch is a MIDI note number.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Tick resolution (pulses per quarter note).
pub const TICKS_PER_QUARTER: u32 = 960;
/// Ticks in a whole note.
pub const TICKS_PER_WHOLE: u32 = 4 * TICKS_PER_QUARTER;

/// A complete compiled score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledScore {
    /// Instruments in display order (top to bottom)
    pub instruments: Vec<Instrument>,
    /// Time signature in force at tick 0
    #[serde(default)]
    pub time_signature: TimeSignature,
    /// Tempo in beats per minute; not used by layout
    #[serde(default = "default_tempo")]
    pub tempo_bpm: f64,
}

fn default_tempo() -> f64 {
    120.0
}

/// One instrument; becomes one staff group in the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Stable identifier, copied into every source reference
    pub id: String,
    /// Display name (e.g., "Piano")
    #[serde(default)]
    pub name: String,
    /// Bracket resolved from instrument family metadata, if known
    #[serde(default)]
    pub bracket: Option<BracketType>,
    /// Staves from top to bottom
    pub staves: Vec<Staff>,
}

/// Grouping symbol drawn at the left of a staff group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketType {
    Brace,
    Bracket,
    None,
}

/// One five-line staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    /// Clef at tick 0
    #[serde(default)]
    pub clef: Clef,
    /// Key signature at tick 0
    #[serde(default)]
    pub key_signature: KeySignature,
    pub voices: Vec<Voice>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Voice {
    pub events: Vec<Event>,
}

/// A timed event within a voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Start time in ticks from the beginning of the score
    pub tick: u32,
    /// Duration in ticks; zero for structural markers
    #[serde(default)]
    pub duration_ticks: u32,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    Note { pitch: u8 },
    Rest,
    Clef { clef: Clef },
    KeySignature { key: KeySignature },
    TimeSignature { time: TimeSignature },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
    Alto,
    Tenor,
}

/// Key signature as a position on the circle of fifths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeySignature {
    /// Number of sharps (positive) or flats (negative), -7..=7
    pub fifths: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    /// Note value of one beat: 1, 2, 4, 8, 16 or 32
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Ticks in one beat (`3840 / denominator`).
    pub fn beat_ticks(&self) -> u32 {
        TICKS_PER_WHOLE / self.denominator.max(1)
    }

    /// Ticks in one full measure, or `None` when that does not fit a tick.
    pub fn measure_ticks(&self) -> Option<u32> {
        self.numerator.checked_mul(self.beat_ticks())
    }

    pub fn is_valid(&self) -> bool {
        self.numerator >= 1
            && matches!(self.denominator, 1 | 2 | 4 | 8 | 16 | 32)
            && self.measure_ticks().is_some()
    }
}

impl KeySignature {
    pub fn new(fifths: i8) -> Self {
        Self { fifths }
    }

    pub fn is_valid(&self) -> bool {
        (-7..=7).contains(&self.fifths)
    }
}

impl Event {
    pub fn note(tick: u32, duration_ticks: u32, pitch: u8) -> Self {
        Self {
            tick,
            duration_ticks,
            kind: EventKind::Note { pitch },
        }
    }

    pub fn rest(tick: u32, duration_ticks: u32) -> Self {
        Self {
            tick,
            duration_ticks,
            kind: EventKind::Rest,
        }
    }

    pub fn clef(tick: u32, clef: Clef) -> Self {
        Self {
            tick,
            duration_ticks: 0,
            kind: EventKind::Clef { clef },
        }
    }

    pub fn key_signature(tick: u32, fifths: i8) -> Self {
        Self {
            tick,
            duration_ticks: 0,
            kind: EventKind::KeySignature {
                key: KeySignature::new(fifths),
            },
        }
    }

    pub fn time_signature(tick: u32, numerator: u32, denominator: u32) -> Self {
        Self {
            tick,
            duration_ticks: 0,
            kind: EventKind::TimeSignature {
                time: TimeSignature::new(numerator, denominator),
            },
        }
    }

    /// True for notes and rests, which occupy a column.
    pub fn is_timed(&self) -> bool {
        matches!(self.kind, EventKind::Note { .. } | EventKind::Rest)
    }

    pub fn end_tick(&self) -> u32 {
        self.tick.saturating_add(self.duration_ticks)
    }
}

impl Staff {
    pub fn new(clef: Clef, voices: Vec<Voice>) -> Self {
        Self {
            clef,
            key_signature: KeySignature::default(),
            voices,
        }
    }

    pub fn with_key(mut self, fifths: i8) -> Self {
        self.key_signature = KeySignature::new(fifths);
        self
    }
}

impl Voice {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl Instrument {
    pub fn new(id: impl Into<String>, name: impl Into<String>, staves: Vec<Staff>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bracket: None,
            staves,
        }
    }
}

impl CompiledScore {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            instruments,
            time_signature: TimeSignature::default(),
            tempo_bpm: default_tempo(),
        }
    }

    /// Parse a compiled score from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let score: CompiledScore = serde_json::from_str(json)?;
        score.validate()?;
        Ok(score)
    }

    /// Iterate over every event with its (instrument, staff, voice, event)
    /// indices.
    pub fn events(&self) -> impl Iterator<Item = (usize, usize, usize, usize, &Event)> + '_ {
        self.instruments
            .iter()
            .enumerate()
            .flat_map(|(ii, inst)| {
                inst.staves.iter().enumerate().flat_map(move |(si, staff)| {
                    staff.voices.iter().enumerate().flat_map(move |(vi, voice)| {
                        voice
                            .events
                            .iter()
                            .enumerate()
                            .map(move |(ei, ev)| (ii, si, vi, ei, ev))
                    })
                })
            })
    }

    /// Latest `tick + duration` over all events, or 0 for an empty score.
    pub fn end_tick(&self) -> u32 {
        self.events()
            .map(|(.., ev)| ev.end_tick())
            .max()
            .unwrap_or(0)
    }

    pub fn note_count(&self) -> usize {
        self.events()
            .filter(|(.., ev)| matches!(ev.kind, EventKind::Note { .. }))
            .count()
    }

    /// Reject structurally invalid input.
    pub fn validate(&self) -> Result<()> {
        if !self.time_signature.is_valid() {
            return Err(LayoutError::InvalidScore(format!(
                "invalid time signature {}/{}",
                self.time_signature.numerator, self.time_signature.denominator
            )));
        }
        for inst in &self.instruments {
            if inst.staves.is_empty() {
                return Err(LayoutError::InvalidScore(format!(
                    "instrument '{}' has no staves",
                    inst.id
                )));
            }
            for staff in &inst.staves {
                if !staff.key_signature.is_valid() {
                    return Err(LayoutError::InvalidScore(format!(
                        "instrument '{}': key signature {} out of range",
                        inst.id, staff.key_signature.fifths
                    )));
                }
            }
        }

        for (ii, si, vi, ei, ev) in self.events() {
            let at = || {
                format!(
                    "instrument '{}' staff {si} voice {vi} event {ei}",
                    self.instruments[ii].id
                )
            };
            if ev.tick.checked_add(ev.duration_ticks).is_none() {
                return Err(LayoutError::InvalidScore(format!(
                    "{}: ends past the last representable tick",
                    at()
                )));
            }
            match &ev.kind {
                EventKind::Note { pitch } => {
                    if *pitch > 127 {
                        return Err(LayoutError::InvalidScore(format!(
                            "{}: pitch {pitch} out of range",
                            at()
                        )));
                    }
                    if ev.duration_ticks == 0 {
                        return Err(LayoutError::InvalidScore(format!(
                            "{}: note with zero duration",
                            at()
                        )));
                    }
                }
                EventKind::Rest => {
                    if ev.duration_ticks == 0 {
                        return Err(LayoutError::InvalidScore(format!(
                            "{}: rest with zero duration",
                            at()
                        )));
                    }
                }
                EventKind::KeySignature { key } => {
                    if !key.is_valid() {
                        return Err(LayoutError::InvalidScore(format!(
                            "{}: key signature {} out of range",
                            at(),
                            key.fifths
                        )));
                    }
                }
                EventKind::TimeSignature { time } => {
                    if !time.is_valid() {
                        return Err(LayoutError::InvalidScore(format!(
                            "{}: invalid time signature {}/{}",
                            at(),
                            time.numerator,
                            time.denominator
                        )));
                    }
                }
                EventKind::Clef { .. } => {}
            }
        }
        Ok(())
    }
}

//! Score builders shared by the integration tests.

#![allow(dead_code)]

use scorelayout::model::Staff;
use scorelayout::{Clef, CompiledScore, Event, Instrument, Voice};

/// `count` notes of equal duration back to back, starting at tick 0.
pub fn run_of_notes(count: u32, duration: u32, pitch: u8) -> Vec<Event> {
    (0..count)
        .map(|i| Event::note(i * duration, duration, pitch))
        .collect()
}

/// A one-staff, one-voice score.
pub fn single_staff(clef: Clef, events: Vec<Event>) -> CompiledScore {
    CompiledScore::new(vec![Instrument::new(
        "p",
        "Solo",
        vec![Staff::new(clef, vec![Voice::new(events)])],
    )])
}

/// A two-staff piano score with the right hand in treble, left hand in bass.
pub fn piano(right: Vec<Event>, left: Vec<Event>) -> CompiledScore {
    CompiledScore::new(vec![Instrument::new(
        "piano",
        "Piano",
        vec![
            Staff::new(Clef::Treble, vec![Voice::new(right)]),
            Staff::new(Clef::Bass, vec![Voice::new(left)]),
        ],
    )])
}

/// `measures` 4/4 measures of quarter notes walking up and down a C major
/// scale inside the treble staff.
pub fn scale_melody(measures: u32) -> CompiledScore {
    const SCALE: [u8; 8] = [64, 65, 67, 69, 71, 72, 74, 76];
    let events = (0..measures * 4)
        .map(|i| {
            let step = (i % 14) as usize;
            let pitch = if step < 8 { SCALE[step] } else { SCALE[14 - step] };
            Event::note(i * 960, 960, pitch)
        })
        .collect();
    single_staff(Clef::Treble, events)
}

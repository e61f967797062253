//! Layout scenarios — end-to-end checks of spacing, breaking, positioning
//! and batching on small programmatic scores.

mod common;

use common::*;
use scorelayout::layout::{
    break_into_systems, column_width, space_columns, ColumnSpec, MeasureInfo,
};
use scorelayout::{
    compute_layout, BarType, BracketType, Clef, Event, LayoutConfig, LayoutWarning,
    SpacingConfig, TickRange, TimeSignature,
};

fn config_with_width(max_system_width: f64) -> LayoutConfig {
    LayoutConfig {
        max_system_width,
        ..LayoutConfig::default()
    }
}

#[test]
fn two_measures_of_quarters_fit_one_system() {
    let spacing = SpacingConfig::default();
    assert_eq!(column_width(960, &spacing), 60.0);
    let columns = vec![
        ColumnSpec {
            duration: 960,
            lead_in: 0.0
        };
        4
    ];
    assert_eq!(space_columns(&columns, &spacing).total_width, 240.0);

    let score = single_staff(Clef::Treble, run_of_notes(8, 960, 72));
    let result = compute_layout(&score, &config_with_width(800.0)).expect("layout failed");
    let layout = &result.layout;
    assert_eq!(layout.systems.len(), 1, "8 quarters should fit one 800-wide system");

    let system = &layout.systems[0];
    assert_eq!(system.tick_range, TickRange::new(0, 7680));

    let staff = &system.staff_groups[0].staves[0];
    let bars: Vec<f64> = staff.bar_lines.iter().map(|b| b.x_position).collect();
    assert_eq!(bars.len(), 2);
    assert!((bars[1] - bars[0] - 240.0).abs() < 0.011, "second measure should be 240 wide");

    // First measure = header + 240; together the note content is 480.
    let line = &staff.staff_lines[0];
    let header = bars[0] - line.start_x - 240.0;
    assert!(header > 0.0);
    assert!((line.end_x - line.start_x - header - 480.0).abs() < 0.011);
    assert_eq!(layout.glyph_count(), 8);
    assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);
    println!("✓ 2×4 quarters: header {header}, system width {}", system.bounding_box.width);
}

#[test]
fn narrow_systems_break_between_measures() {
    let score = single_staff(Clef::Treble, run_of_notes(8, 960, 72));
    let result = compute_layout(&score, &config_with_width(400.0)).expect("layout failed");
    let systems = &result.layout.systems;
    assert_eq!(systems.len(), 2);
    assert_eq!(systems[0].tick_range, TickRange::new(0, 3840));
    assert_eq!(systems[1].tick_range, TickRange::new(3840, 7680));
    for system in systems {
        let glyphs: usize = system.staff_groups[0].staves[0]
            .glyph_runs
            .iter()
            .map(|r| r.glyphs.len())
            .sum();
        assert_eq!(glyphs, 4, "each system holds exactly one measure");
    }
}

#[test]
fn oversized_measure_becomes_its_own_system() {
    let measures: Vec<MeasureInfo> = [300.0, 900.0, 300.0]
        .iter()
        .enumerate()
        .map(|(i, &width)| MeasureInfo {
            index: i,
            width,
            tick_range: TickRange::new(i as u32 * 3840, (i as u32 + 1) * 3840),
        })
        .collect();
    let mut warnings = Vec::new();
    let systems = break_into_systems(&measures, 800.0, &mut warnings);
    assert_eq!(systems.len(), 3);
    assert_eq!(systems[1].width, 900.0);
    assert_eq!(systems[1].measures, 1..2);
    assert!(matches!(
        warnings.as_slice(),
        [LayoutWarning::OversizedMeasure { measure_index: 1, .. }]
    ));

    // End to end: every measure is wider than 200.
    let score = single_staff(Clef::Treble, run_of_notes(8, 960, 72));
    let result = compute_layout(&score, &config_with_width(200.0)).expect("layout failed");
    assert_eq!(result.layout.systems.len(), 2);
    let oversized = result
        .warnings
        .iter()
        .filter(|w| matches!(w, LayoutWarning::OversizedMeasure { .. }))
        .count();
    assert_eq!(oversized, 2);
    assert!(result.layout.total_width > 200.0);
}

#[test]
fn oversized_measure_keeps_its_full_width() {
    // Three dotted quarters, then 36 thirty-seconds at 25 units each.
    let mut events = run_of_notes(3, 1440, 72);
    events.extend((0..36).map(|i| Event::note(4320 + i * 120, 120, 72)));
    let mut score = single_staff(Clef::Treble, events);
    score.time_signature = TimeSignature::new(9, 8);

    let result = compute_layout(&score, &config_with_width(800.0)).expect("layout failed");
    let systems = &result.layout.systems;
    assert_eq!(systems.len(), 2);
    assert_eq!(systems[1].tick_range, TickRange::new(4320, 8640));
    assert_eq!(systems[1].bounding_box.width, 900.0);
    assert_eq!(result.layout.total_width, 900.0);
    assert_eq!(
        result.warnings,
        vec![LayoutWarning::OversizedMeasure {
            measure_index: 1,
            width: 900.0,
            max_system_width: 800.0,
        }]
    );
}

#[test]
fn clef_change_inside_a_measure_moves_later_notes() {
    let score = single_staff(
        Clef::Treble,
        vec![
            Event::note(0, 960, 72),
            Event::note(960, 960, 72),
            Event::clef(1920, Clef::Bass),
            Event::note(1920, 960, 50), // D3: middle line in bass
            Event::note(2880, 960, 53), // F3: fourth line in bass
        ],
    );
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);

    let staff = &result.layout.systems[0].staff_groups[0].staves[0];
    let middle = staff.staff_lines[2].y_position;
    let fourth = staff.staff_lines[1].y_position;
    let heads: Vec<_> = staff.glyphs().collect();
    assert_eq!(heads.len(), 4, "no ledger lines under the new clef");
    assert!((heads[2].position.y - middle).abs() < 0.011);
    assert!((heads[3].position.y - fourth).abs() < 0.011);

    let structural: Vec<u32> = staff.structural_glyphs.iter().map(|g| g.codepoint).collect();
    assert_eq!(structural, vec![0xE050, 0xE084, 0xE084, 0xE062]);
    let clef = &staff.structural_glyphs[3];
    assert_eq!(
        clef.source_reference.as_ref().map(|s| s.event_index),
        Some(2)
    );
    assert!(clef.bounding_box.x > heads[1].bounding_box.right());
    assert!(clef.bounding_box.right() < heads[2].position.x);
}

#[test]
fn clef_change_after_the_last_note_is_reported() {
    let mut events = run_of_notes(4, 960, 72);
    events.push(Event::clef(3000, Clef::Bass));
    let score = single_staff(Clef::Treble, events);
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    assert_eq!(
        result.warnings,
        vec![LayoutWarning::UnappliedStructuralChange { tick: 3000 }]
    );
    let staff = &result.layout.systems[0].staff_groups[0].staves[0];
    assert!(staff.structural_glyphs.iter().all(|g| g.codepoint != 0xE062));
}

#[test]
fn notes_emit_only_heads_accidentals_and_ledger_lines() {
    let score = single_staff(
        Clef::Treble,
        vec![
            Event::note(0, 240, 84),   // C6, two ledger lines
            Event::note(240, 240, 73), // C#5
            Event::note(480, 240, 72), // C natural
            Event::note(720, 240, 71),
        ],
    );
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    let staff = &result.layout.systems[0].staff_groups[0].staves[0];
    let codepoints: Vec<u32> = staff.glyphs().map(|g| g.codepoint).collect();
    assert_eq!(
        codepoints,
        vec![0xE022, 0xE022, 0xE0A4, 0xE262, 0xE0A4, 0xE261, 0xE0A4, 0xE0A4]
    );
}

#[test]
fn same_pitch_under_two_clefs() {
    let notehead_y = |clef: Clef| -> f64 {
        let score = single_staff(clef, vec![Event::note(0, 3840, 60)]);
        let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
        let staff = &result.layout.systems[0].staff_groups[0].staves[0];
        let top = staff.staff_lines[0].y_position;
        let head = staff.glyphs().last().expect("notehead");
        head.position.y - top
    };
    let treble = notehead_y(Clef::Treble);
    let bass = notehead_y(Clef::Bass);
    // Middle C: first ledger line below the treble staff, above the bass staff.
    assert!((treble - 50.0).abs() < 0.011, "treble offset {treble}");
    assert!((bass + 10.0).abs() < 0.011, "bass offset {bass}");
    assert_eq!(treble, notehead_y(Clef::Treble), "offsets must be reproducible");
    assert_eq!(bass, notehead_y(Clef::Bass), "offsets must be reproducible");
}

#[test]
fn identical_noteheads_batch_into_few_runs() {
    let score = single_staff(Clef::Treble, run_of_notes(200, 960, 72));
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    let glyphs = result.layout.glyph_count();
    let runs = result.layout.run_count();
    assert_eq!(glyphs, 200);
    let ratio = glyphs as f64 / runs as f64;
    assert!(ratio > 10.0, "glyph/run ratio {ratio} too low ({glyphs} glyphs, {runs} runs)");
    println!("✓ 200 noteheads in {runs} runs (ratio {ratio:.1})");
}

#[test]
fn staff_lines_are_exactly_one_space_apart() {
    let score = piano(run_of_notes(8, 960, 72), run_of_notes(4, 1920, 48));
    let config = LayoutConfig {
        units_per_space: 12.5,
        ..LayoutConfig::default()
    };
    let result = compute_layout(&score, &config).expect("layout failed");
    for staff in result.layout.staves() {
        for pair in staff.staff_lines.windows(2) {
            assert!((pair[1].y_position - pair[0].y_position - 12.5).abs() < 1e-9);
        }
    }
}

#[test]
fn system_tick_ranges_are_contiguous_and_measure_aligned() {
    let score = scale_melody(24);
    let result = compute_layout(&score, &config_with_width(500.0)).expect("layout failed");
    let systems = &result.layout.systems;
    assert!(systems.len() > 1);
    assert_eq!(systems[0].tick_range.start_tick, 0);
    assert_eq!(systems.last().unwrap().tick_range.end_tick, 24 * 3840);
    for pair in systems.windows(2) {
        assert_eq!(pair[0].tick_range.end_tick, pair[1].tick_range.start_tick);
    }
    for system in systems {
        assert_eq!(system.tick_range.start_tick % 3840, 0, "system starts mid-measure");
    }
}

#[test]
fn piano_gets_a_brace_and_a_final_bar() {
    let score = piano(run_of_notes(8, 960, 72), run_of_notes(4, 1920, 48));
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    let group = &result.layout.systems[0].staff_groups[0];
    assert_eq!(group.instrument_id, "piano");
    assert_eq!(group.bracket_type, BracketType::Brace);
    assert_eq!(group.staves.len(), 2);

    let gap = group.staves[1].staff_lines[0].y_position - group.staves[0].staff_lines[4].y_position;
    assert!((gap - 60.0).abs() < 0.011, "default staff gap is 6 spaces, got {gap}");

    for staff in &group.staves {
        assert_eq!(staff.bar_lines.last().map(|b| b.bar_type), Some(BarType::Final));
        assert_eq!(staff.structural_glyphs.len(), 3, "clef and two time digits");
    }
}

#[test]
fn simultaneous_notes_align_across_staves() {
    let score = piano(run_of_notes(4, 960, 72), run_of_notes(4, 960, 48));
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    let group = &result.layout.systems[0].staff_groups[0];
    let xs = |i: usize| -> Vec<f64> {
        group.staves[i]
            .glyphs()
            .filter(|g| g.codepoint == 0xE0A4)
            .map(|g| g.position.x)
            .collect()
    };
    assert_eq!(xs(0), xs(1));
}

#[test]
fn accidentals_and_key_changes_are_drawn() {
    let mut events = run_of_notes(4, 960, 72);
    events[1] = Event::note(960, 960, 73); // C#5
    events[2] = Event::note(1920, 960, 72); // C5 again: natural
    events.push(Event::key_signature(3840, -3));
    events.extend((4..8).map(|i| Event::note(i * 960, 960, 75))); // Eb5 in the key
    let score = single_staff(Clef::Treble, events);
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    let staff = &result.layout.systems[0].staff_groups[0].staves[0];

    let codepoints: Vec<u32> = staff.glyphs().map(|g| g.codepoint).collect();
    assert_eq!(codepoints.iter().filter(|&&c| c == 0xE262).count(), 1, "one sharp");
    assert_eq!(codepoints.iter().filter(|&&c| c == 0xE261).count(), 1, "one natural");
    assert_eq!(codepoints.iter().filter(|&&c| c == 0xE260).count(), 0, "Eb is in the key");

    let key_flats = staff
        .structural_glyphs
        .iter()
        .filter(|g| g.codepoint == 0xE260)
        .count();
    assert_eq!(key_flats, 3);
}

#[test]
fn rest_only_measures_use_one_column_per_beat() {
    let mut events = run_of_notes(4, 960, 72);
    events.push(Event::rest(3840, 3840));
    let score = single_staff(Clef::Treble, events);
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    let staff = &result.layout.systems[0].staff_groups[0].staves[0];
    let bars: Vec<f64> = staff.bar_lines.iter().map(|b| b.x_position).collect();
    assert!((bars[1] - bars[0] - 240.0).abs() < 0.011);

    let rest = staff.glyphs().last().expect("rest glyph");
    assert_eq!(rest.codepoint, 0xE4E3);
    assert!((rest.position.x - bars[0]).abs() < 0.011, "whole rest starts the measure");
}

#[test]
fn every_glyph_points_back_to_its_event() {
    let score = piano(run_of_notes(8, 960, 72), run_of_notes(4, 1920, 48));
    let result = compute_layout(&score, &LayoutConfig::default()).expect("layout failed");
    for system in &result.layout.systems {
        for group in &system.staff_groups {
            for (si, staff) in group.staves.iter().enumerate() {
                for glyph in staff.glyphs() {
                    let source = glyph.source_reference.as_ref().expect("source reference");
                    assert_eq!(source.instrument_id, "piano");
                    assert_eq!(source.staff_index, si);
                    let input = &score.instruments[0].staves[si].voices[source.voice_index];
                    assert!(source.event_index < input.events.len());
                }
            }
        }
    }
}

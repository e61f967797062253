//! Determinism tests — the same score and configuration must always
//! serialize to the same bytes, across repeated runs and across threads.

mod common;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use common::*;
use scorelayout::{compute_layout, Clef, CompiledScore, Event, LayoutConfig};

fn layout_bytes(score: &CompiledScore, config: &LayoutConfig) -> Vec<u8> {
    compute_layout(score, config)
        .expect("layout failed")
        .layout
        .canonical_bytes()
        .expect("serialization failed")
}

fn digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

fn busy_score() -> CompiledScore {
    let mut right = Vec::new();
    for i in 0..64u32 {
        let pitch = [72u8, 73, 75, 78, 80, 61, 84, 58][(i % 8) as usize];
        right.push(Event::note(i * 480, 480, pitch));
    }
    right.push(Event::key_signature(7680, 2));
    right.push(Event::clef(15360, Clef::Alto));
    let mut left = run_of_notes(14, 1920, 43);
    left.push(Event::rest(26880, 3840));
    left.push(Event::time_signature(30720, 3, 4));
    piano(right, left)
}

#[test]
fn repeated_runs_produce_identical_bytes() {
    let score = busy_score();
    let config = LayoutConfig::default();
    let reference = layout_bytes(&score, &config);
    let reference_digest = digest(&reference);
    for run in 1..10 {
        let bytes = layout_bytes(&score, &config);
        assert_eq!(digest(&bytes), reference_digest, "run {run} diverged");
        assert_eq!(bytes, reference);
    }
    println!("✓ 10 runs, {} bytes, digest {reference_digest:016x}", reference.len());
}

#[test]
fn threads_agree_with_the_main_thread() {
    let score = busy_score();
    let config = LayoutConfig {
        max_system_width: 600.0,
        ..LayoutConfig::default()
    };
    let expected = layout_bytes(&score, &config);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let score = score.clone();
            let config = config.clone();
            thread::spawn(move || layout_bytes(&score, &config))
        })
        .collect();
    for handle in handles {
        let bytes = handle.join().expect("layout thread panicked");
        assert_eq!(bytes, expected);
    }
}

#[test]
fn json_input_and_programmatic_input_agree() {
    let score = scale_melody(6);
    let json = serde_json::to_string(&score).expect("score serializes");
    let reparsed = CompiledScore::from_json(&json).expect("score parses");
    let config = LayoutConfig::default();
    assert_eq!(layout_bytes(&reparsed, &config), layout_bytes(&score, &config));
}

#[test]
fn warnings_are_reported_in_a_stable_order() {
    let score = busy_score();
    let config = LayoutConfig {
        max_system_width: 150.0,
        ..LayoutConfig::default()
    };
    let first = compute_layout(&score, &config).expect("layout failed").warnings;
    assert!(!first.is_empty());
    for _ in 0..5 {
        let again = compute_layout(&score, &config).expect("layout failed").warnings;
        assert_eq!(again, first);
    }
}

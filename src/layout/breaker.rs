//! System breaking — greedy partition of measures into systems, and the
//! vertical stacking of the resulting systems.

use std::ops::Range;

use crate::error::LayoutWarning;
use crate::geometry::{round2, TickRange};

/// A measure as the breaker sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureInfo {
    pub index: usize,
    pub width: f64,
    pub tick_range: TickRange,
}

/// Measures assigned to one system.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemBreak {
    pub index: usize,
    /// Indices into the measure list
    pub measures: Range<usize>,
    pub width: f64,
    pub tick_range: TickRange,
}

/// Partition `measures` into systems no wider than `max_width`.
///
/// A measure that alone exceeds `max_width` is never split; it becomes a
/// system of its own and an `OversizedMeasure` warning is recorded.
pub fn break_into_systems(
    measures: &[MeasureInfo],
    max_width: f64,
    warnings: &mut Vec<LayoutWarning>,
) -> Vec<SystemBreak> {
    let mut systems = Vec::new();
    let mut start = 0usize;
    let mut width = 0.0;

    for (i, measure) in measures.iter().enumerate() {
        if i > start && round2(width + measure.width) > max_width {
            systems.push(close_system(systems.len(), measures, start..i, width));
            start = i;
            width = 0.0;
        }
        if measure.width > max_width {
            warnings.push(LayoutWarning::OversizedMeasure {
                measure_index: measure.index,
                width: measure.width,
                max_system_width: max_width,
            });
        }
        width = round2(width + measure.width);
    }
    if start < measures.len() {
        systems.push(close_system(systems.len(), measures, start..measures.len(), width));
    }

    log::debug!(
        "broke {} measures into {} systems (max width {max_width})",
        measures.len(),
        systems.len()
    );
    systems
}

fn close_system(
    index: usize,
    measures: &[MeasureInfo],
    range: Range<usize>,
    width: f64,
) -> SystemBreak {
    let start_tick = measures[range.start].tick_range.start_tick;
    let end_tick = measures[range.end - 1].tick_range.end_tick;
    SystemBreak {
        index,
        measures: range,
        width,
        tick_range: TickRange::new(start_tick, end_tick),
    }
}

/// Top y of each system: every system starts `spacing` below the bottom
/// of the previous one.
pub fn stack_systems(heights: &[f64], spacing: f64) -> Vec<f64> {
    let mut tops = Vec::with_capacity(heights.len());
    let mut y = 0.0;
    for (i, height) in heights.iter().enumerate() {
        if i > 0 {
            y = round2(y + spacing);
        }
        tops.push(y);
        y = round2(y + height);
    }
    tops
}

/// Total height of stacked systems (no trailing spacing).
pub fn stacked_height(heights: &[f64], spacing: f64) -> f64 {
    match (stack_systems(heights, spacing).last(), heights.last()) {
        (Some(top), Some(height)) => round2(top + height),
        _ => 0.0,
    }
}

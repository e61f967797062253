//! Measure grid: boundaries, structural state and columns.
//!
//! Measure boundaries come from tick arithmetic and the time signatures in
//! force. Key and time markers take effect at the first boundary at or after
//! their tick. A clef marker inside a measure takes effect at the first
//! column at or after its tick and is drawn there; without such a column it
//! moves on to the next boundary. Columns gather every timed event that
//! starts at the same tick inside a measure, across all instruments, staves
//! and voices.

use std::collections::BTreeMap;

use crate::error::{LayoutError, LayoutWarning, Result};
use crate::geometry::TickRange;
use crate::model::{Clef, CompiledScore, EventKind, KeySignature, TimeSignature};

/// Index path to one event of the input score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventRef {
    pub instrument: usize,
    pub staff: usize,
    pub voice: usize,
    pub event: usize,
}

/// A timed event assigned to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnEntry {
    pub source: EventRef,
    /// Position of the staff in the flattened staff list
    pub slot: usize,
    pub tick: u32,
    pub duration: u32,
    /// `None` for rests
    pub pitch: Option<u8>,
}

/// Every timed event starting at one tick of a measure.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub tick: u32,
    /// Shortest duration among the entries
    pub shortest: u32,
    /// Sorted by staff slot, then voice, then event index
    pub entries: Vec<ColumnEntry>,
}

/// A change of clef or key on one staff, and the marker that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shown<T> {
    pub value: T,
    pub source: Option<EventRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChange {
    pub from: KeySignature,
    pub to: KeySignature,
}

/// Structural glyphs one staff shows at the start of a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaffHeader {
    pub clef: Option<Shown<Clef>>,
    pub key: Option<Shown<KeyChange>>,
    pub time: Option<Shown<TimeSignature>>,
}

impl StaffHeader {
    pub fn is_empty(&self) -> bool {
        self.clef.is_none() && self.key.is_none() && self.time.is_none()
    }
}

/// Clef and key in force on one staff during a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffState {
    pub clef: Clef,
    pub key: KeySignature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridMeasure {
    pub index: usize,
    pub tick_range: TickRange,
    pub time: TimeSignature,
    /// Per staff slot
    pub states: Vec<StaffState>,
    /// Per staff slot
    pub headers: Vec<StaffHeader>,
    /// Time-ordered columns; empty when the measure holds no notes
    pub columns: Vec<Column>,
    /// Rests of a measure without notes, placed proportionally to their tick
    pub free_rests: Vec<ColumnEntry>,
    /// Clef changes inside the measure, sorted by column then slot
    pub inline_clefs: Vec<InlineClef>,
}

/// A clef change drawn in front of a column instead of at a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineClef {
    pub slot: usize,
    /// Index of the first column at or after the marker
    pub column: usize,
    pub clef: Clef,
    pub source: EventRef,
}

impl GridMeasure {
    pub fn has_header(&self) -> bool {
        self.headers.iter().any(|h| !h.is_empty())
    }

    /// Clef in force on `slot` at column `column`.
    pub fn clef_at(&self, slot: usize, column: usize) -> Clef {
        self.inline_clefs
            .iter()
            .filter(|c| c.slot == slot && c.column <= column)
            .last()
            .map_or(self.states[slot].clef, |c| c.clef)
    }

    /// Clef changes drawn in front of column `column`.
    pub fn clefs_before(&self, column: usize) -> impl Iterator<Item = &InlineClef> {
        self.inline_clefs.iter().filter(move |c| c.column == column)
    }
}

/// One staff of the flattened staff list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffSlot {
    pub instrument: usize,
    pub staff: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasureGrid {
    pub slots: Vec<StaffSlot>,
    pub measures: Vec<GridMeasure>,
}

// ═══════════════════════════════════════════════════════════════════════
// Structural markers
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct Marker<T> {
    tick: u32,
    value: T,
    source: EventRef,
}

/// Markers sorted by tick, stable with respect to input order.
struct MarkerQueue<T> {
    markers: Vec<Marker<T>>,
    next: usize,
}

impl<T: Copy> MarkerQueue<T> {
    fn new(mut markers: Vec<Marker<T>>) -> Self {
        markers.sort_by_key(|m| (m.tick, m.source));
        Self { markers, next: 0 }
    }

    /// Apply every marker due at `boundary`, reporting those that were
    /// moved forward. Returns the last value applied.
    fn take_due(
        &mut self,
        boundary: u32,
        warnings: &mut Vec<LayoutWarning>,
    ) -> Option<(T, EventRef)> {
        let mut applied = None;
        while let Some(marker) = self.markers.get(self.next) {
            if marker.tick > boundary {
                break;
            }
            if marker.tick < boundary {
                warnings.push(LayoutWarning::SnappedStructuralChange {
                    tick: marker.tick,
                    applied_at: boundary,
                });
            }
            applied = Some((marker.value, marker.source));
            self.next += 1;
        }
        applied
    }

    /// Take the next marker if it falls before `end` and `accept` finds a
    /// place for it.
    fn take_before<R>(
        &mut self,
        end: u32,
        accept: impl FnOnce(u32) -> Option<R>,
    ) -> Option<(T, EventRef, R)> {
        let marker = self.markers.get(self.next).filter(|m| m.tick < end)?;
        let placed = accept(marker.tick)?;
        self.next += 1;
        Some((marker.value, marker.source, placed))
    }

    /// Report every marker that never took effect.
    fn drain_unapplied(&mut self, warnings: &mut Vec<LayoutWarning>) {
        for marker in &self.markers[self.next..] {
            warnings.push(LayoutWarning::UnappliedStructuralChange { tick: marker.tick });
        }
        self.next = self.markers.len();
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Grid construction
// ═══════════════════════════════════════════════════════════════════════

/// Measure boundaries up to the first boundary at or after `end_tick`.
fn measure_ranges(
    initial: TimeSignature,
    end_tick: u32,
    time_markers: &mut MarkerQueue<TimeSignature>,
    warnings: &mut Vec<LayoutWarning>,
) -> Result<Vec<(TickRange, TimeSignature, Option<Shown<TimeSignature>>)>> {
    let mut ranges = Vec::new();
    let mut current = initial;
    let mut start = 0u32;
    while start < end_tick {
        let shown = match time_markers.take_due(start, warnings) {
            Some((time, source)) if time != current || start == 0 => {
                current = time;
                Some(Shown {
                    value: time,
                    source: Some(source),
                })
            }
            _ if start == 0 => Some(Shown {
                value: current,
                source: None,
            }),
            _ => None,
        };
        let overflow = || {
            LayoutError::InvalidScore(format!(
                "measure {} starting at tick {start} ends past the last representable tick",
                ranges.len()
            ))
        };
        let len = current.measure_ticks().ok_or_else(overflow)?;
        if len == 0 {
            break;
        }
        let end = start.checked_add(len).ok_or_else(overflow)?;
        ranges.push((TickRange::new(start, end), current, shown));
        start = end;
    }
    Ok(ranges)
}

/// Build the measure grid for a score.
pub fn build_grid(score: &CompiledScore, warnings: &mut Vec<LayoutWarning>) -> Result<MeasureGrid> {
    let slots: Vec<StaffSlot> = score
        .instruments
        .iter()
        .enumerate()
        .flat_map(|(ii, inst)| {
            (0..inst.staves.len()).map(move |si| StaffSlot {
                instrument: ii,
                staff: si,
            })
        })
        .collect();
    let slot_of = |instrument: usize, staff: usize| -> usize {
        slots
            .iter()
            .position(|s| s.instrument == instrument && s.staff == staff)
            .unwrap_or(0)
    };

    let mut time_markers = Vec::new();
    let mut clef_markers: Vec<Vec<Marker<Clef>>> = vec![Vec::new(); slots.len()];
    let mut key_markers: Vec<Vec<Marker<KeySignature>>> = vec![Vec::new(); slots.len()];
    let mut timed = Vec::new();

    for (ii, si, vi, ei, ev) in score.events() {
        let source = EventRef {
            instrument: ii,
            staff: si,
            voice: vi,
            event: ei,
        };
        let slot = slot_of(ii, si);
        match ev.kind {
            EventKind::TimeSignature { time } => time_markers.push(Marker {
                tick: ev.tick,
                value: time,
                source,
            }),
            EventKind::Clef { clef } => clef_markers[slot].push(Marker {
                tick: ev.tick,
                value: clef,
                source,
            }),
            EventKind::KeySignature { key } => key_markers[slot].push(Marker {
                tick: ev.tick,
                value: key,
                source,
            }),
            EventKind::Note { pitch } => timed.push(ColumnEntry {
                source,
                slot,
                tick: ev.tick,
                duration: ev.duration_ticks,
                pitch: Some(pitch),
            }),
            EventKind::Rest => timed.push(ColumnEntry {
                source,
                slot,
                tick: ev.tick,
                duration: ev.duration_ticks,
                pitch: None,
            }),
        }
    }

    let end_tick = score.end_tick();
    let mut time_queue = MarkerQueue::new(time_markers);
    let ranges = measure_ranges(score.time_signature, end_tick, &mut time_queue, warnings)?;
    if ranges.is_empty() {
        return Ok(MeasureGrid {
            slots,
            measures: Vec::new(),
        });
    }

    // Distribute timed events into their measures.
    let starts: Vec<u32> = ranges.iter().map(|(range, ..)| range.start_tick).collect();
    let mut per_measure: Vec<Vec<ColumnEntry>> = vec![Vec::new(); ranges.len()];
    for entry in timed {
        let mi = starts.partition_point(|&s| s <= entry.tick).saturating_sub(1);
        per_measure[mi].push(entry);
    }

    // Structural state per measure and slot.
    let mut clef_queues: Vec<_> = clef_markers.into_iter().map(MarkerQueue::new).collect();
    let mut key_queues: Vec<_> = key_markers.into_iter().map(MarkerQueue::new).collect();
    let mut current: Vec<StaffState> = slots
        .iter()
        .map(|s| {
            let staff = &score.instruments[s.instrument].staves[s.staff];
            StaffState {
                clef: staff.clef,
                key: staff.key_signature,
            }
        })
        .collect();

    let mut measures: Vec<GridMeasure> = Vec::with_capacity(ranges.len());
    for (index, ((tick_range, time, time_shown), entries)) in
        ranges.into_iter().zip(per_measure).enumerate()
    {
        let first = index == 0;
        let (columns, free_rests) = if entries.iter().any(|e| e.pitch.is_some()) {
            (group_columns(entries), Vec::new())
        } else {
            let mut rests = entries;
            rests.sort_by_key(|e| (e.tick, e.slot, e.source));
            (Vec::new(), rests)
        };

        let mut states = Vec::with_capacity(slots.len());
        let mut headers = Vec::with_capacity(slots.len());
        let mut inline_clefs = Vec::new();
        for slot in 0..slots.len() {
            let before = current[slot];
            let clef_change = clef_queues[slot].take_due(tick_range.start_tick, warnings);
            let key_change = key_queues[slot].take_due(tick_range.start_tick, warnings);

            let mut state = before;
            let mut header = StaffHeader {
                time: time_shown,
                ..StaffHeader::default()
            };

            if let Some((clef, source)) = clef_change {
                state.clef = clef;
                if first || clef != before.clef {
                    header.clef = Some(Shown {
                        value: clef,
                        source: Some(source),
                    });
                }
            } else if first {
                header.clef = Some(Shown {
                    value: before.clef,
                    source: None,
                });
            }

            let key_from = if first {
                KeySignature::default()
            } else {
                before.key
            };
            if let Some((key, source)) = key_change {
                state.key = key;
                if first || key != before.key {
                    header.key = Some(Shown {
                        value: KeyChange { from: key_from, to: key },
                        source: Some(source),
                    });
                }
            } else if first {
                header.key = Some(Shown {
                    value: KeyChange {
                        from: key_from,
                        to: before.key,
                    },
                    source: None,
                });
            }

            // Clef changes inside the measure attach to the next column.
            let mut in_force = state.clef;
            while let Some((clef, source, column)) =
                clef_queues[slot].take_before(tick_range.end_tick, |tick| {
                    columns.iter().position(|c| c.tick >= tick)
                })
            {
                if clef != in_force {
                    inline_clefs.push(InlineClef {
                        slot,
                        column,
                        clef,
                        source,
                    });
                    in_force = clef;
                }
            }

            current[slot] = StaffState {
                clef: in_force,
                ..state
            };
            states.push(state);
            headers.push(header);
        }
        inline_clefs.sort_by_key(|c| (c.column, c.slot));

        measures.push(GridMeasure {
            index,
            tick_range,
            time,
            states,
            headers,
            columns,
            free_rests,
            inline_clefs,
        });
    }

    time_queue.drain_unapplied(warnings);
    for queue in clef_queues.iter_mut() {
        queue.drain_unapplied(warnings);
    }
    for queue in key_queues.iter_mut() {
        queue.drain_unapplied(warnings);
    }

    log::debug!(
        "measure grid: {} measures over {} ticks, {} staves",
        measures.len(),
        end_tick,
        slots.len()
    );

    Ok(MeasureGrid { slots, measures })
}

fn group_columns(entries: Vec<ColumnEntry>) -> Vec<Column> {
    let mut by_tick: BTreeMap<u32, Vec<ColumnEntry>> = BTreeMap::new();
    for entry in entries {
        by_tick.entry(entry.tick).or_default().push(entry);
    }
    by_tick
        .into_iter()
        .map(|(tick, mut entries)| {
            entries.sort_by_key(|e| (e.slot, e.source.voice, e.source.event));
            let shortest = entries.iter().map(|e| e.duration).min().unwrap_or(0);
            Column {
                tick,
                shortest,
                entries,
            }
        })
        .collect()
}

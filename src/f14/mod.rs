//! Reader for UrQMD "file 14" ASCII event logs.
//!
//! A `.f14` file is a sequence of event blocks. Each block opens with a
//! header whose first line starts with the token `UQMD`, carries the event's
//! numeric id on an `event#` line and the sampled impact parameter on an
//! `impact_parameter_real/min/max(fm):` line, and is followed by one 15-field
//! line per outgoing particle. Interspersed metadata lines are ignored.
//!
//! The reader is split into four pieces that compose in one direction:
//! [`source`] pulls raw lines in bounded batches, [`classify`] names each
//! line, [`segment`] tracks which event the reader is inside of, and
//! [`coerce`] turns a particle line into a typed record. None of them look
//! ahead, so event blocks may straddle batch boundaries freely.

pub mod classify;
pub mod coerce;
pub mod segment;
pub mod source;

use std::io::BufRead;

use classify::classify;
use segment::EventSegmenter;

/// Particle-row count of one event, as reported by [`scan_events`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventCount {
    /// The event's id (embedded id when present, provisional otherwise).
    pub event_id: u32,
    /// Rows classified as particle lines within the event, before coercion.
    pub particle_rows: u64,
}

/// Single-pass quick look: one entry per event in input order, counting the
/// lines classified as particle rows (coercion is not applied, matching the
/// raw per-event counts the legacy reader printed).
///
/// Events that contain no particle rows do not appear, since the counts
/// aggregate the emitted row stream.
pub fn scan_events<R: BufRead>(reader: R) -> std::io::Result<Vec<EventCount>> {
    let mut segmenter = EventSegmenter::new();
    let mut counts: Vec<EventCount> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let Some(tag) = segmenter.advance(classify(&tokens)) {
            match counts.last_mut() {
                Some(last) if last.event_id == tag.event_id => last.particle_rows += 1,
                _ => counts.push(EventCount {
                    event_id: tag.event_id,
                    particle_rows: 1,
                }),
            }
        }
    }
    Ok(counts)
}

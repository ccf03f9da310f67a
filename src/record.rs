//! Core data types shared by the reader and the columnar store.

use serde::{Deserialize, Serialize};

/// One outgoing particle from a UrQMD collision event.
///
/// Field order and names follow the 15-column particle lines of the
/// simulation's event-log output: freeze-out time and position, then the
/// energy-momentum four-vector, then the discrete particle codes. Records are
/// immutable once coerced; the two trailing `event_*` fields are inherited
/// from the enclosing event header, not from the particle line itself.
///
/// Numeric widths are the smallest that hold the legacy value ranges:
///
/// - kinematic fields are `f32` (continuous quantities, fm and GeV scale);
/// - `ityp` is `i16` (UrQMD particle codes lie within ±1000);
/// - `iso` is `i8` (doubled isospin projection, magnitude at most 4);
/// - `chg` is `i8` (electric charge, -2..=2);
/// - `lcl` and `ncl` are `u32` (non-negative collision counters);
/// - `coll` is `i32` (signed process/origin code).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    /// Freeze-out time, fm/c.
    pub r0: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    /// Total energy, GeV.
    pub p0: f32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    /// Rest mass, GeV.
    pub m: f32,
    /// UrQMD particle-type code (1 = nucleon, 101 = pion, 106 = kaon, ...).
    pub ityp: i16,
    /// Doubled isospin projection 2*I3.
    pub iso: i8,
    /// Electric charge.
    pub chg: i8,
    /// Index of the particle's last collision.
    pub lcl: u32,
    /// Number of collisions the particle underwent.
    pub ncl: u32,
    /// Process code of the particle's origin.
    pub coll: i32,
    /// Id of the event this particle belongs to (0 before any event header).
    pub event_id: u32,
    /// Sampled impact parameter of the enclosing event, fm (NaN when the
    /// header did not carry one).
    pub event_impact_parameter: f32,
}

/// An ordered batch of coerced records, the unit handed from the reader to
/// the store.
///
/// A chunk never carries event-boundary ambiguity: every record in it is
/// already tagged. `index` is the zero-based production sequence number, kept
/// for diagnostics only.
#[derive(Clone, Debug, Default)]
pub struct RowChunk {
    pub index: u64,
    pub rows: Vec<ParticleRecord>,
}

impl RowChunk {
    /// Creates a chunk with the given sequence number and row capacity.
    pub fn with_capacity(index: u64, capacity: usize) -> Self {
        Self {
            index,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// True when the chunk holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows in the chunk.
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

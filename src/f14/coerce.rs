//! Token-to-record coercion.
//!
//! Floats are parsed directly to `f32`, never through `f64`, so a value that
//! came out of the store and was formatted with `Display` re-parses to the
//! exact same bits. Non-finite values are rejected: the store holds physical
//! quantities and a NaN energy is a defective row, not data. Integers are
//! parsed at their target width, so out-of-range literals surface as parse
//! failures instead of silent truncation.
//!
//! Coercion failure is never fatal. The caller drops the row and counts it;
//! that is the entire recovery story, inherited from the legacy pipeline's
//! null-filtering.

use thiserror::Error;

use super::classify::PARTICLE_FIELD_COUNT;
use super::segment::EventTag;
use crate::record::ParticleRecord;

/// Column names of a particle line, in file order.
pub const FIELD_NAMES: [&str; PARTICLE_FIELD_COUNT] = [
    "r0", "rx", "ry", "rz", "p0", "px", "py", "pz", "m", "ityp", "iso", "chg", "lcl", "ncl",
    "coll",
];

/// Why one particle row was dropped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("expected 15 fields, found {found}")]
    FieldCount { found: usize },

    #[error("field `{field}`: `{token}` is not a finite float")]
    Float { field: &'static str, token: String },

    #[error("field `{field}`: `{token}` is not an integer in range")]
    Int { field: &'static str, token: String },
}

/// Coerces the 15 tokens of a particle line into a [`ParticleRecord`] stamped
/// with the enclosing event's tag.
pub fn coerce_particle(tokens: &[&str], tag: EventTag) -> Result<ParticleRecord, CoercionError> {
    if tokens.len() != PARTICLE_FIELD_COUNT {
        return Err(CoercionError::FieldCount {
            found: tokens.len(),
        });
    }
    Ok(ParticleRecord {
        r0: parse_float(FIELD_NAMES[0], tokens[0])?,
        rx: parse_float(FIELD_NAMES[1], tokens[1])?,
        ry: parse_float(FIELD_NAMES[2], tokens[2])?,
        rz: parse_float(FIELD_NAMES[3], tokens[3])?,
        p0: parse_float(FIELD_NAMES[4], tokens[4])?,
        px: parse_float(FIELD_NAMES[5], tokens[5])?,
        py: parse_float(FIELD_NAMES[6], tokens[6])?,
        pz: parse_float(FIELD_NAMES[7], tokens[7])?,
        m: parse_float(FIELD_NAMES[8], tokens[8])?,
        ityp: parse_int(FIELD_NAMES[9], tokens[9])?,
        iso: parse_int(FIELD_NAMES[10], tokens[10])?,
        chg: parse_int(FIELD_NAMES[11], tokens[11])?,
        lcl: parse_int(FIELD_NAMES[12], tokens[12])?,
        ncl: parse_int(FIELD_NAMES[13], tokens[13])?,
        coll: parse_int(FIELD_NAMES[14], tokens[14])?,
        event_id: tag.event_id,
        event_impact_parameter: tag.impact_parameter,
    })
}

fn parse_float(field: &'static str, token: &str) -> Result<f32, CoercionError> {
    let value: f32 = token.parse().map_err(|_| CoercionError::Float {
        field,
        token: token.to_owned(),
    })?;
    if !value.is_finite() {
        return Err(CoercionError::Float {
            field,
            token: token.to_owned(),
        });
    }
    Ok(value)
}

fn parse_int<T: std::str::FromStr>(field: &'static str, token: &str) -> Result<T, CoercionError> {
    token.parse().map_err(|_| CoercionError::Int {
        field,
        token: token.to_owned(),
    })
}

//! Line classification for the event-log grammar.
//!
//! Classification is a pure function over one line's whitespace-separated
//! tokens and is total: every line maps to exactly one [`LineClass`], so no
//! parse error can originate here. Marker checks take precedence over the
//! token-count rule, which keeps a marker line safe even if a format revision
//! ever pads it to 15 tokens.

/// First token of the line that opens a new event block.
pub const EVENT_START_MARKER: &str = "UQMD";

/// First token of the header line carrying the event's own numeric id.
pub const EVENT_ID_MARKER: &str = "event#";

/// First token of the header line carrying the sampled impact parameter.
pub const IMPACT_PARAMETER_MARKER: &str = "impact_parameter_real/min/max(fm):";

/// Token count of a particle line.
pub const PARTICLE_FIELD_COUNT: usize = 15;

/// What one line of input means to the reader.
///
/// The value-carrying variants hold the raw token; parsing is deferred to the
/// segmenter and coercer so that classification never fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// Start of a new event block.
    EventStart,
    /// The event header line naming the event's embedded id.
    EventId(&'a str),
    /// The event header line naming the sampled impact parameter in fm.
    ImpactParameter(&'a str),
    /// A 15-field particle line.
    ParticleRow,
    /// Anything else: empty lines, table headers, unknown token counts.
    Ignorable,
}

/// Classifies one line's tokens.
///
/// A marker line whose value token is missing is `Ignorable` rather than an
/// error. Known ambiguity: a header or metadata line with exactly 15 tokens is
/// indistinguishable from a particle line here and is classified as one; the
/// coercer drops it as non-numeric and it shows up in the dropped-row counter.
pub fn classify<'a>(tokens: &[&'a str]) -> LineClass<'a> {
    match tokens.first() {
        None => LineClass::Ignorable,
        Some(&EVENT_START_MARKER) => LineClass::EventStart,
        Some(&EVENT_ID_MARKER) => match tokens.get(1) {
            Some(&id) => LineClass::EventId(id),
            None => LineClass::Ignorable,
        },
        Some(&IMPACT_PARAMETER_MARKER) => match tokens.get(1) {
            Some(&b) => LineClass::ImpactParameter(b),
            None => LineClass::Ignorable,
        },
        Some(_) if tokens.len() == PARTICLE_FIELD_COUNT => LineClass::ParticleRow,
        Some(_) => LineClass::Ignorable,
    }
}

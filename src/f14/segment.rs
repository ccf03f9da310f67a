//! Event segmentation state machine.
//!
//! [`EventSegmenter`] consumes classified lines strictly in input order and
//! stamps every particle row with the event it belongs to. The state lives in
//! this one struct, owned by whoever drives the read loop, so it survives
//! chunk boundaries by construction and two concurrent runs can never share
//! or clobber each other's event counter.
//!
//! Event-id policy: the embedded id from an `event#` header wins. The
//! event-start marker only advances a provisional sequential id so that files
//! without id lines still segment correctly; a following id marker overwrites
//! it. Ids that fail to parse are ignored with a warning, ids that move
//! backwards are adopted but flagged, since either means the producing
//! simulation misbehaved and the data is suspect, not unusable.

use tracing::warn;

use super::classify::LineClass;

/// The pair of event-level values stamped onto every particle row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventTag {
    /// Event id, 0 before any event header has been seen.
    pub event_id: u32,
    /// Sampled impact parameter in fm, NaN until the header line arrives.
    pub impact_parameter: f32,
}

impl EventTag {
    fn none() -> Self {
        Self {
            event_id: 0,
            impact_parameter: f32::NAN,
        }
    }
}

/// Stateful accumulator turning classified lines into tagged particle rows.
#[derive(Debug)]
pub struct EventSegmenter {
    current: EventTag,
    saw_event: bool,
    events_begun: u64,
    orphan_rows: u64,
}

impl EventSegmenter {
    /// Creates a segmenter with no event context.
    pub fn new() -> Self {
        Self {
            current: EventTag::none(),
            saw_event: false,
            events_begun: 0,
            orphan_rows: 0,
        }
    }

    /// Feeds one classified line through the state machine.
    ///
    /// Returns the tag to stamp on the row when the line is a particle row,
    /// `None` for every other class. The tag depends only on lines already
    /// seen; there is no lookahead.
    pub fn advance(&mut self, class: LineClass<'_>) -> Option<EventTag> {
        match class {
            LineClass::EventStart => {
                self.begin_event();
                None
            }
            LineClass::EventId(token) => {
                self.adopt_event_id(token);
                None
            }
            LineClass::ImpactParameter(token) => {
                self.set_impact_parameter(token);
                None
            }
            LineClass::ParticleRow => Some(self.tag_particle()),
            LineClass::Ignorable => None,
        }
    }

    /// The tag that the next particle row would receive.
    pub fn current_tag(&self) -> EventTag {
        self.current
    }

    /// Number of events begun so far.
    pub fn events_begun(&self) -> u64 {
        self.events_begun
    }

    /// Number of particle rows seen before the first event header.
    pub fn orphan_rows(&self) -> u64 {
        self.orphan_rows
    }

    fn begin_event(&mut self) {
        self.current.event_id = self.current.event_id.saturating_add(1);
        self.current.impact_parameter = f32::NAN;
        self.saw_event = true;
        self.events_begun += 1;
    }

    fn adopt_event_id(&mut self, token: &str) {
        let id: u32 = match token.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!(token, "unparseable event id in header; keeping provisional id");
                return;
            }
        };
        if self.saw_event && id < self.current.event_id {
            warn!(
                embedded = id,
                provisional = self.current.event_id,
                "event id moved backwards; adopting it anyway"
            );
        }
        if !self.saw_event {
            warn!(id, "event id header before any event start marker");
            self.saw_event = true;
            self.events_begun += 1;
        }
        self.current.event_id = id;
    }

    fn set_impact_parameter(&mut self, token: &str) {
        match token.parse::<f32>() {
            Ok(b) => self.current.impact_parameter = b,
            Err(_) => warn!(token, "unparseable impact parameter in header; keeping NaN"),
        }
    }

    fn tag_particle(&mut self) -> EventTag {
        if !self.saw_event {
            if self.orphan_rows == 0 {
                warn!("particle row before first event header; tagging with event id 0");
            }
            self.orphan_rows += 1;
        }
        self.current
    }
}

impl Default for EventSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_start_advances_provisional_id() {
        let mut seg = EventSegmenter::new();
        seg.advance(LineClass::EventStart);
        let tag = seg.advance(LineClass::ParticleRow).unwrap();
        assert_eq!(tag.event_id, 1);
        seg.advance(LineClass::EventStart);
        assert_eq!(seg.current_tag().event_id, 2);
        assert_eq!(seg.events_begun(), 2);
    }

    #[test]
    fn embedded_id_overrides_provisional() {
        let mut seg = EventSegmenter::new();
        seg.advance(LineClass::EventStart);
        seg.advance(LineClass::EventId("41"));
        assert_eq!(seg.current_tag().event_id, 41);
        // The next event start continues from the adopted id.
        seg.advance(LineClass::EventStart);
        assert_eq!(seg.current_tag().event_id, 42);
    }

    #[test]
    fn unparseable_id_keeps_provisional() {
        let mut seg = EventSegmenter::new();
        seg.advance(LineClass::EventStart);
        seg.advance(LineClass::EventId("forty-one"));
        assert_eq!(seg.current_tag().event_id, 1);
    }

    #[test]
    fn backwards_id_is_still_adopted() {
        let mut seg = EventSegmenter::new();
        seg.advance(LineClass::EventStart);
        seg.advance(LineClass::EventId("100"));
        seg.advance(LineClass::EventStart);
        seg.advance(LineClass::EventId("7"));
        assert_eq!(seg.current_tag().event_id, 7);
    }

    #[test]
    fn impact_parameter_is_reset_per_event() {
        let mut seg = EventSegmenter::new();
        seg.advance(LineClass::EventStart);
        seg.advance(LineClass::ImpactParameter("7.25"));
        let tag = seg.advance(LineClass::ParticleRow).unwrap();
        assert_eq!(tag.impact_parameter, 7.25);

        // New event, no impact line yet: back to NaN.
        seg.advance(LineClass::EventStart);
        let tag = seg.advance(LineClass::ParticleRow).unwrap();
        assert!(tag.impact_parameter.is_nan());
    }

    #[test]
    fn rows_before_any_event_are_orphans_with_id_zero() {
        let mut seg = EventSegmenter::new();
        let tag = seg.advance(LineClass::ParticleRow).unwrap();
        assert_eq!(tag.event_id, 0);
        seg.advance(LineClass::ParticleRow);
        assert_eq!(seg.orphan_rows(), 2);

        // Rows inside a real event are not orphans.
        seg.advance(LineClass::EventStart);
        seg.advance(LineClass::ParticleRow);
        assert_eq!(seg.orphan_rows(), 2);
    }

    #[test]
    fn ignorable_lines_do_not_disturb_state() {
        let mut seg = EventSegmenter::new();
        seg.advance(LineClass::EventStart);
        seg.advance(LineClass::ImpactParameter("3.0"));
        seg.advance(LineClass::Ignorable);
        let tag = seg.advance(LineClass::ParticleRow).unwrap();
        assert_eq!(tag.event_id, 1);
        assert_eq!(tag.impact_parameter, 3.0);
    }
}

//! C3: FT-line arbiter (spec.md §4.3) — owns one [`ftline::FtLineState`]
//! per configured FT line and fans side-effect events out to an
//! [`crate::publisher::Observer`].

pub mod ftline;
pub mod lineside;
pub mod window;

pub use ftline::{ControlKind, Decision, FtLineEvent, FtLineState, FtLineTag, ResetFlavor};
pub use lineside::{JitterHistogram, LineSideStats, Side};

use crate::publisher::Observer;

/// Category/type pair for an OPRA category-`H` control message, used to
/// resolve the [`ControlKind`] the arbiter should apply (spec.md §4.3
/// "Reset logic").
pub fn control_kind_for(category: u8, msg_type: u8) -> ControlKind {
    match (category, msg_type) {
        (b'H', b'C') => ControlKind::StartOfDay,
        (b'H', b'K') | (b'H', b'A') => ControlKind::SequenceReset,
        (b'H', b'B') | (b'H', b'N') => ControlKind::PassThrough,
        (b'C', _) => ControlKind::PassThrough,
        _ => ControlKind::PassThrough,
    }
}

/// Owns per-FT-line arbitration state for every line this process is
/// responsible for.
pub struct Arbiter {
    lines: Vec<FtLineState>,
}

impl Arbiter {
    pub fn new(num_lines: u16, jump_threshold: u64, jitter_enabled: bool) -> Self {
        let lines = (0..num_lines)
            .map(|i| FtLineState::new(i, jump_threshold, jitter_enabled))
            .collect();
        Arbiter { lines }
    }

    pub fn line(&self, ftline: u16) -> &FtLineState {
        &self.lines[ftline as usize]
    }

    pub fn line_mut(&mut self, ftline: u16) -> &mut FtLineState {
        &mut self.lines[ftline as usize]
    }

    pub fn num_lines(&self) -> u16 {
        self.lines.len() as u16
    }

    /// Arbitrates one packet and forwards any resulting events to `observer`.
    pub fn arrive(
        &mut self,
        ftline: u16,
        side: Side,
        sn: u64,
        k: u16,
        observer: &mut dyn Observer,
    ) -> Decision {
        let mut events = Vec::new();
        let decision = self.lines[ftline as usize].arrive(side, sn, k, &mut events);
        self.dispatch_events(ftline, &events, observer);
        decision
    }

    /// Routes a category-`H` (or administrative category `C`) control
    /// message to the owning line, returning the resulting events so the
    /// caller can react beyond the observer hook (e.g. sweeping the option
    /// table's daily high/low on a start-of-day reset).
    pub fn handle_control(
        &mut self,
        ftline: u16,
        side: Side,
        category: u8,
        msg_type: u8,
        sn: u64,
        observer: &mut dyn Observer,
    ) -> Vec<FtLineEvent> {
        let kind = control_kind_for(category, msg_type);
        let mut events = Vec::new();
        self.lines[ftline as usize].handle_control(side, kind, sn, &mut events);
        self.dispatch_events(ftline, &events, observer);
        events
    }

    fn dispatch_events(&self, ftline: u16, events: &[FtLineEvent], observer: &mut dyn Observer) {
        for event in events {
            observer.on_ftline_event(ftline, *event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::NoopObserver;

    #[test]
    fn control_kind_resolution_matches_spec_table() {
        assert_eq!(control_kind_for(b'H', b'C'), ControlKind::StartOfDay);
        assert_eq!(control_kind_for(b'H', b'K'), ControlKind::SequenceReset);
        assert_eq!(control_kind_for(b'H', b'A'), ControlKind::SequenceReset);
        assert_eq!(control_kind_for(b'H', b'B'), ControlKind::PassThrough);
        assert_eq!(control_kind_for(b'H', b'N'), ControlKind::PassThrough);
        assert_eq!(control_kind_for(b'C', b'X'), ControlKind::PassThrough);
    }

    #[test]
    fn arbiter_routes_by_ftline_index() {
        let mut a = Arbiter::new(4, 100_000, false);
        let mut obs = NoopObserver;
        a.handle_control(2, Side::A, b'H', b'C', 5000, &mut obs);
        assert_eq!(a.line(2).expected_sn(), 5000);
        assert_eq!(a.line(0).expected_sn(), 0);
    }
}

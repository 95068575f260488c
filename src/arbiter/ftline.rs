//! C3: per-FT-line arbitration — the sliding-window duplicate/gap
//! detector that fuses A/B into one ordered logical stream (spec.md §4.3).

use crate::arbiter::lineside::{LineSideStats, Side};
use crate::arbiter::window::SlidingWindow;

/// Aggregate FT-line state tag (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtLineTag {
    Ok,
    Stale,
}

/// Outcome of `FtLineState::arrive` for one packet (spec.md §4.3 "Contract").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Deliver,
    DropDup,
    DropLate,
    DropWaitingReset,
}

/// Control-message reset flavors routed from category `H` (spec.md §4.3
/// "Reset logic"). `(category, type)` pairs as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// `H/C`: start-of-day. Transitions to OK, reinitializes the window,
    /// clears `missing`.
    StartOfDay,
    /// `H/K` sequence reset, or `H/A` start-of-test-cycle: reinitialize the
    /// window but do not alter the state tag.
    SequenceReset,
    /// Administrative category `C`, or `H/B`/`H/N`: no window update.
    PassThrough,
}

/// Side-effect notifications emitted on FT-line state transitions
/// (spec.md §4.3 "Side effects").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtLineEvent {
    BecameStale,
    Reset(ResetFlavor),
    LargeJumpReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetFlavor {
    StartOfDay,
    SequenceReset,
}

/// Per-FT-line arbitration state: the expected cursor, the outstanding
/// loss counter, the 512-slot window, the aggregate tag, and the
/// reset-pending flags for each side (spec.md §3 "FT-line state").
pub struct FtLineState {
    pub index: u16,
    window: SlidingWindow,
    line_sn: u64,
    missing: u64,
    tag: FtLineTag,
    time_hwm_usec: u64,
    reset_pending: [bool; 2],
    initialized: bool,
    jump_threshold: u64,
    pub side_stats: [LineSideStats; 2],
}

impl FtLineState {
    pub fn new(index: u16, jump_threshold: u64, jitter_enabled: bool) -> Self {
        FtLineState {
            index,
            window: SlidingWindow::init_around(0),
            line_sn: 0,
            missing: 0,
            tag: FtLineTag::Ok,
            time_hwm_usec: 0,
            reset_pending: [false, false],
            initialized: false,
            jump_threshold,
            side_stats: [LineSideStats::new(jitter_enabled), LineSideStats::new(jitter_enabled)],
        }
    }

    pub fn tag(&self) -> FtLineTag {
        self.tag
    }

    pub fn expected_sn(&self) -> u64 {
        self.line_sn
    }

    pub fn missing(&self) -> u64 {
        self.missing
    }

    pub fn window_value(&self, sn: u64) -> u64 {
        self.window.get(sn)
    }

    /// Records a diagnostic, non-authoritative time high-watermark
    /// (spec.md §4.3 "Time tracking").
    pub fn observe_time(&mut self, participant_time_usec: u64) {
        if participant_time_usec > self.time_hwm_usec {
            self.time_hwm_usec = participant_time_usec;
        }
    }

    fn reset_window_around(&mut self, base: u64) {
        self.window = SlidingWindow::init_around(base);
        self.line_sn = base;
    }

    /// Handles a category `H`/`C`-routed control message (spec.md §4.3
    /// "Reset logic"). `kind` is `PassThrough` for administrative category
    /// `C` and `H/B`/`H/N`, which do not touch the window.
    ///
    /// A side's own reset is mirrored back to it once the peer's copy has
    /// already armed `reset_pending` for this side (`lh_line_reset` in the
    /// original, `examples/original_source/feeds/opra/fast/common/fh_opra_lh.c`):
    /// that second, later-arriving copy is a no-op besides clearing the
    /// flag it tripped over — it must not re-run the reset or re-arm the
    /// peer, or two sides issuing their own start-of-day in turn would
    /// ping-pong `reset_pending` back and forth forever.
    pub fn handle_control(
        &mut self,
        side: Side,
        kind: ControlKind,
        sn: u64,
        events: &mut Vec<FtLineEvent>,
    ) {
        if self.reset_pending[side.index()] {
            self.reset_pending[side.index()] = false;
            return;
        }
        match kind {
            ControlKind::StartOfDay => {
                self.reset_window_around(sn);
                self.missing = 0;
                self.tag = FtLineTag::Ok;
                self.initialized = true;
                self.reset_pending[side.peer().index()] = true;
                events.push(FtLineEvent::Reset(ResetFlavor::StartOfDay));
            }
            ControlKind::SequenceReset => {
                self.reset_window_around(sn);
                self.initialized = true;
                self.reset_pending[side.peer().index()] = true;
                events.push(FtLineEvent::Reset(ResetFlavor::SequenceReset));
            }
            ControlKind::PassThrough => {}
        }
        // The side that issued the reset is no longer itself pending.
        self.reset_pending[side.index()] = false;
    }

    /// Classifies and (if accepted) applies one message's sequence number
    /// against the line cursor and window, mutating line state in place.
    /// Returns the per-message decision prior to the atomic whole-packet
    /// rule applied by `arrive`.
    fn classify_one(&mut self, sn: u64, events: &mut Vec<FtLineEvent>) -> Decision {
        if sn >= self.line_sn + self.jump_threshold && self.initialized {
            self.reset_window_around(sn.saturating_sub(1));
            self.initialized = true;
            events.push(FtLineEvent::LargeJumpReset);
        }

        if sn == self.line_sn + 1 {
            self.line_sn = sn;
            let displaced = self.window.store(sn);
            self.maybe_go_stale(sn, displaced, events);
            self.initialized = true;
            return Decision::Deliver;
        }

        if sn <= self.line_sn {
            let win_sn = self.window.get(sn);
            if win_sn == sn {
                return Decision::DropDup;
            }
            if sn == win_sn.wrapping_add(crate::arbiter::window::WINDOW_SIZE as u64) {
                self.missing = self.missing.saturating_sub(1);
                return Decision::Deliver;
            }
            return Decision::DropLate;
        }

        // sn > line_sn + 1: gap.
        self.missing += sn - self.line_sn - 1;
        self.line_sn = sn;
        let displaced = self.window.store(sn);
        self.maybe_go_stale(sn, displaced, events);
        self.initialized = true;
        Decision::Deliver
    }

    fn maybe_go_stale(&mut self, sn: u64, displaced: u64, events: &mut Vec<FtLineEvent>) {
        if self.tag == FtLineTag::Stale {
            return;
        }
        let expected_displaced = sn.wrapping_sub(crate::arbiter::window::WINDOW_SIZE as u64);
        if displaced != expected_displaced {
            self.tag = FtLineTag::Stale;
            events.push(FtLineEvent::BecameStale);
        }
    }

    /// Arbitrates one packet of `k` messages starting at `sn` arriving on
    /// `side` (spec.md §4.3 "Contract"/"Decision rules"). Packets are
    /// atomic: if any of the `k` messages is a duplicate, the whole packet
    /// is dropped and no state mutation from this call is retained.
    pub fn arrive(&mut self, side: Side, sn: u64, k: u16, events: &mut Vec<FtLineEvent>) -> Decision {
        if self.reset_pending[side.index()] {
            return Decision::DropWaitingReset;
        }

        // Snapshot for atomic rollback on an in-batch duplicate.
        let snapshot_line_sn = self.line_sn;
        let snapshot_missing = self.missing;
        let snapshot_window = self.window.clone();
        let snapshot_tag = self.tag;
        let snapshot_initialized = self.initialized;
        let mut local_events = Vec::new();

        let mut worst: Option<Decision> = None;
        for i in 0..k.max(1) as u64 {
            let decision = self.classify_one(sn + i, &mut local_events);
            match decision {
                Decision::DropDup => {
                    self.line_sn = snapshot_line_sn;
                    self.missing = snapshot_missing;
                    self.window = snapshot_window;
                    self.tag = snapshot_tag;
                    self.initialized = snapshot_initialized;
                    return Decision::DropDup;
                }
                Decision::DropLate => {
                    if worst.is_none() {
                        worst = Some(Decision::DropLate);
                    }
                }
                Decision::Deliver => {}
                Decision::DropWaitingReset => unreachable!("not produced by classify_one"),
            }
        }

        match worst {
            Some(Decision::DropLate) => {
                self.line_sn = snapshot_line_sn;
                self.missing = snapshot_missing;
                self.window = snapshot_window;
                self.tag = snapshot_tag;
                self.initialized = snapshot_initialized;
                Decision::DropLate
            }
            _ => {
                events.extend(local_events);
                Decision::Deliver
            }
        }
    }
}

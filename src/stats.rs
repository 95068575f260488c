//! Atomics-based statistics aggregate (SPEC_FULL.md §3 "Ambient addition
//! — statistics"), grounded on the teacher's `NatsTradePublisher`
//! `AtomicU64` counter pattern. Snapshotted periodically and handed to
//! `Observer::on_periodic_stats` per `periodic_stats`/
//! `periodic_stats_interval` (spec.md §6).

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters, safe to read from the out-of-scope management
/// thread without synchronizing with the ingest loop (spec.md §5
/// "Scheduling": "a separate management thread... never mutates core
/// state except via two explicitly-marked fields").
#[derive(Debug, Default)]
pub struct FeedStats {
    pub packets_received: AtomicU64,
    pub duplicates: AtomicU64,
    pub late_dropped: AtomicU64,
    pub waiting_reset_dropped: AtomicU64,
    pub recoveries: AtomicU64,
    pub gaps_detected: AtomicU64,
    pub stale_transitions: AtomicU64,
    pub large_jump_resets: AtomicU64,
    pub decode_errors: AtomicU64,
    pub table_exhausted: AtomicU64,
    pub table_entries: AtomicU64,
    pub option_level_superseded: AtomicU64,
    pub loop_iterations: AtomicU64,
    pub loop_timeouts: AtomicU64,
}

impl FeedStats {
    pub fn new() -> Self {
        FeedStats::default()
    }

    pub fn snapshot(&self) -> FeedStatsSnapshot {
        FeedStatsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            late_dropped: self.late_dropped.load(Ordering::Relaxed),
            waiting_reset_dropped: self.waiting_reset_dropped.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
            gaps_detected: self.gaps_detected.load(Ordering::Relaxed),
            stale_transitions: self.stale_transitions.load(Ordering::Relaxed),
            large_jump_resets: self.large_jump_resets.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            table_exhausted: self.table_exhausted.load(Ordering::Relaxed),
            table_entries: self.table_entries.load(Ordering::Relaxed),
            option_level_superseded: self.option_level_superseded.load(Ordering::Relaxed),
            loop_iterations: self.loop_iterations.load(Ordering::Relaxed),
            loop_timeouts: self.loop_timeouts.load(Ordering::Relaxed),
        }
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A point-in-time, non-atomic copy of [`FeedStats`], suitable for
/// serialization or display by an observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStatsSnapshot {
    pub packets_received: u64,
    pub duplicates: u64,
    pub late_dropped: u64,
    pub waiting_reset_dropped: u64,
    pub recoveries: u64,
    pub gaps_detected: u64,
    pub stale_transitions: u64,
    pub large_jump_resets: u64,
    pub decode_errors: u64,
    pub table_exhausted: u64,
    pub table_entries: u64,
    pub option_level_superseded: u64,
    pub loop_iterations: u64,
    pub loop_timeouts: u64,
}

//! Per-physical-line counters (spec.md §3 "Line-side state").
//!
//! Line-side state lives for the process lifetime; it is never destroyed
//! mid-run, even while its FT line is STALE.

/// Which physical stream a packet arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn peer(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Optional latency histogram, dumped every 100,000 samples when
/// `jitter_stats` is enabled (spec.md §4.5 "Jitter measurement").
#[derive(Debug, Clone, Default)]
pub struct JitterHistogram {
    /// Coarse microsecond buckets: [0-99, 100-999, 1000-9999, 10000+].
    buckets: [u64; 4],
    samples: u64,
}

impl JitterHistogram {
    pub fn record(&mut self, delta_usec: u64) {
        let bucket = if delta_usec < 100 {
            0
        } else if delta_usec < 1_000 {
            1
        } else if delta_usec < 10_000 {
            2
        } else {
            3
        };
        self.buckets[bucket] += 1;
        self.samples += 1;
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn buckets(&self) -> [u64; 4] {
        self.buckets
    }

    /// `true` once 100,000 samples have accumulated since the last dump
    /// (spec.md §4.5). Resets the counter on return.
    pub fn due_for_dump(&mut self) -> bool {
        if self.samples >= 100_000 {
            self.samples = 0;
            self.buckets = [0; 4];
            true
        } else {
            false
        }
    }
}

/// Per-side counters for one physical line (A or B of some FT line).
#[derive(Debug, Clone, Default)]
pub struct LineSideStats {
    pub packets: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub late: u64,
    pub messages: u64,
    pub bytes: u64,
    pub losses: u64,
    pub recoveries: u64,
    pub last_seen_sn: u64,
    pub jitter: Option<JitterHistogram>,
}

impl LineSideStats {
    pub fn new(jitter_enabled: bool) -> Self {
        LineSideStats {
            jitter: jitter_enabled.then(JitterHistogram::default),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_peer_is_involutive() {
        assert_eq!(Side::A.peer(), Side::B);
        assert_eq!(Side::B.peer().peer(), Side::B);
    }

    #[test]
    fn histogram_dumps_after_threshold() {
        let mut h = JitterHistogram::default();
        for _ in 0..99_999 {
            h.record(5);
        }
        assert!(!h.due_for_dump());
        h.record(5);
        assert!(h.due_for_dump());
        assert_eq!(h.samples(), 0);
    }
}

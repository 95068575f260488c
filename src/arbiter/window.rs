//! The 512-slot per-FT-line sliding window (spec.md §4.3).

pub const WINDOW_SIZE: usize = 512;

/// Circular array mapping `sn mod 512 -> last sequence number stored at
/// that slot`. A fresh `sn` satisfies `sn ≡ W[sn mod 512] (mod 512)`; a
/// duplicate satisfies `sn == W[sn mod 512]` exactly (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    slots: [u64; WINDOW_SIZE],
}

impl SlidingWindow {
    /// Re-centers the window around `base`. Slot `i` is set to the largest
    /// value `v <= base` with `v ≡ i (mod 512)` (spec.md §4.3 "Sliding
    /// window": "slot i is initialized to hold the value base - (512 - i)",
    /// expressed here via each slot's own congruence class so that the
    /// window-correctness invariant — `sn ≡ W[sn mod 512] (mod 512)` for
    /// every fresh `sn` — holds immediately after a reset, not just after
    /// 512 further messages). Used both for the very first message after
    /// construction and for every reset flavor.
    pub fn init_around(base: u64) -> Self {
        let mut slots = [0u64; WINDOW_SIZE];
        let base_i = base as i64;
        for (i, slot) in slots.iter_mut().enumerate() {
            let delta = (base_i - i as i64).rem_euclid(WINDOW_SIZE as i64);
            *slot = (base_i - delta) as u64;
        }
        SlidingWindow { slots }
    }

    pub fn get(&self, sn: u64) -> u64 {
        self.slots[(sn as usize) % WINDOW_SIZE]
    }

    /// Stores `sn` in its slot. Returns the value that was displaced, so
    /// the caller can detect an unrecoverable gap (spec.md §4.3: "the
    /// displaced slot value is not exactly sn - 512").
    pub fn store(&mut self, sn: u64) -> u64 {
        let idx = (sn as usize) % WINDOW_SIZE;
        let displaced = self.slots[idx];
        self.slots[idx] = sn;
        displaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_sequence_is_not_a_duplicate() {
        let w = SlidingWindow::init_around(100);
        // Any sn in [100-511, 100] other than exactly stored values won't
        // equal itself yet.
        assert_ne!(w.get(500), 500);
    }

    #[test]
    fn storing_then_reading_back_matches() {
        let mut w = SlidingWindow::init_around(100);
        w.store(500);
        assert_eq!(w.get(500), 500);
    }

    #[test]
    fn displaced_value_reported_on_store() {
        let mut w = SlidingWindow::init_around(1000);
        let displaced_before = w.get(1000);
        let displaced = w.store(1000);
        assert_eq!(displaced, displaced_before);
    }
}

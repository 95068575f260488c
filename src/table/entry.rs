//! Option-state entries owned by the [`super::OptionTable`] arena.

use crate::listed::ListedOptionRecord;
use crate::table::key::OptionKey;
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Per-message change bitmap carried on the outgoing wire record so the
    /// downstream publisher can decide which fields changed.
    ///
    /// `update_flags` is reset to a configured baseline (either [`UpdateFlags::ALL`]
    /// or a curated value-added subset) at the start of each handler and
    /// OR'd with the bits below as fields actually change, per spec.md §4.4.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
    pub struct UpdateFlags: u32 {
        const PARTICIPANT    = 1 << 0;
        const YEAR           = 1 << 1;
        const OPEN_BID        = 1 << 2;
        const OPEN_OFFER      = 1 << 3;
        const OPEN_PRICE     = 1 << 4;
        const CLOSE_PRICE    = 1 << 5;
        const LAST_PRICE     = 1 << 6;
        const DAILY_HIGH     = 1 << 7;
        const DAILY_LOW      = 1 << 8;
        const BID            = 1 << 9;
        const OFFER          = 1 << 10;
        const SESSION        = 1 << 11;
        const BBO_BID_PART   = 1 << 12;
        const BBO_OFFER_PART = 1 << 13;
        const CUM_VOLUME     = 1 << 14;
        const CUM_VALUE      = 1 << 15;
        const OPEN_INTEREST  = 1 << 16;
        const HALT_TIME      = 1 << 17;
        const UNHALT_TIME    = 1 << 18;
        const NET_CHANGE     = 1 << 19;
        const EXPIRATION     = 1 << 20;

        /// Full-image baseline: every field is considered changed.
        const ALL = u32::MAX;
        /// Curated "value-added" baseline (spec.md §4.4): participant, year,
        /// open, last, high, low, bid, offer, session, BBO participants.
        const VALUE_ADDED = Self::PARTICIPANT.bits()
            | Self::YEAR.bits()
            | Self::OPEN_PRICE.bits()
            | Self::LAST_PRICE.bits()
            | Self::DAILY_HIGH.bits()
            | Self::DAILY_LOW.bits()
            | Self::BID.bits()
            | Self::OFFER.bits()
            | Self::SESSION.bits()
            | Self::BBO_BID_PART.bits()
            | Self::BBO_OFFER_PART.bits();
    }
}

/// 32-bit handle into the option-table arena. Stable for the process
/// lifetime: never reused, never relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionHandle(pub u32);

/// A price expressed in OPRA's ISE-normalized fixed-point form, produced by
/// [`crate::processor::price::normalize`]. Stored as `i64` scaled by
/// `10^PRICE_SCALE` to avoid floating point on the hot path.
pub const PRICE_SCALE: u32 = 4;

/// Derived market state and bookkeeping for a single listed option.
///
/// Created once on first observation of its key (`OptionTable::insert`);
/// its arena slot is never relocated, so raw references handed out by the
/// table remain valid for the process lifetime (spec.md §3 invariants).
#[derive(Debug)]
pub struct OptionEntry {
    pub key: OptionKey,
    /// Rendered topic string, at most 32 characters (spec.md §3).
    pub topic: String,
    /// Shared, immutable-for-process-lifetime listed-option directory entry.
    pub listed: Option<Arc<ListedOptionRecord>>,
    /// Set on the first successful handler update; before that the entry
    /// is a bare shell created by `insert`.
    pub initialized: bool,
    pub update_flags: UpdateFlags,

    /// FT line this entry is permanently assigned to.
    pub ftline: u16,
    /// Opaque back-pointer for the external publisher (e.g. a pre-rendered
    /// topic handle). Never dereferenced by the core.
    pub publisher_token: Option<crate::publisher::TopicHandle>,

    pub exp_raw: [u8; 6],
    pub session: u8,
    pub bbo_bid_participant: u8,
    pub bbo_offer_participant: u8,
    pub last_participant: u8,
    pub last_participant_time_usec: u64,
    pub last_seq_num: u32,

    pub opening_bid: i64,
    pub opening_offer: i64,
    pub opening_price: i64,
    pub closing_price: i64,
    pub last_price: i64,
    pub eod_high: i64,
    pub eod_low: i64,
    pub daily_high: i64,
    pub daily_low: i64,
    pub bid_price: i64,
    pub offer_price: i64,

    pub cum_volume: u64,
    pub cum_value: u64,

    pub open_interest: u32,
    pub halt_time_usec: u64,
    pub unhalt_time_usec: u64,
}

impl OptionEntry {
    /// Zero-initialized entry for `key`, as produced by `OptionTable::insert`.
    pub fn new(key: OptionKey, ftline: u16, topic: String) -> Self {
        OptionEntry {
            key,
            topic,
            listed: None,
            initialized: false,
            update_flags: UpdateFlags::empty(),
            ftline,
            publisher_token: None,
            exp_raw: [0; 6],
            session: 0,
            bbo_bid_participant: 0,
            bbo_offer_participant: 0,
            last_participant: 0,
            last_participant_time_usec: 0,
            last_seq_num: 0,
            opening_bid: 0,
            opening_offer: 0,
            opening_price: 0,
            closing_price: 0,
            last_price: 0,
            eod_high: 0,
            eod_low: 0,
            daily_high: 0,
            daily_low: 0,
            bid_price: 0,
            offer_price: 0,
            cum_volume: 0,
            cum_value: 0,
            open_interest: 0,
            halt_time_usec: 0,
            unhalt_time_usec: 0,
        }
    }

    /// Resets the entry's baseline update-flags at the start of a handler,
    /// per spec.md §4.4. `baseline` is the configured `all` / `value_added`
    /// selection.
    pub fn begin_update(&mut self, baseline: UpdateFlags) {
        self.update_flags = baseline;
    }

    /// Resets the daily high/low extremes back to unset (spec.md §3:
    /// "reset only by explicit start-of-day control messages"). Called once
    /// per entry when the owning FT line observes a start-of-day reset.
    pub fn reset_daily_range(&mut self) {
        self.daily_low = 0;
        self.daily_high = 0;
    }

    /// `daily_low > 0 ⇒ daily_low ≤ daily_high` invariant (spec.md §3),
    /// checked defensively in tests and debug builds.
    #[cfg(debug_assertions)]
    pub fn check_daily_range_invariant(&self) {
        if self.daily_low > 0 {
            debug_assert!(self.daily_low <= self.daily_high);
        }
    }
}

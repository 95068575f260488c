//! Wire output records (spec.md §6 "Wire output"): a performance header,
//! an OPRA header copy, and a per-category payload, serialized as JSON
//! (the teacher's `orderbook` crate likewise hands `serde`-derived
//! structs to its publisher rather than hand-rolling byte layouts).

use crate::table::UpdateFlags;
use serde::Serialize;

/// `{feed_type, category, type, process_id, generation_time_usec,
/// sequence_number}` (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct PerfHeader {
    pub feed_type: u8,
    pub category: u8,
    pub msg_type: u8,
    pub process_id: u32,
    pub generation_time_usec: u64,
    pub sequence_number: u64,
}

/// `{category, type, participant, sequence, time}`, a verbatim copy of
/// the fields carried in the OPRA message header (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct OpraHeader {
    pub category: u8,
    pub msg_type: u8,
    pub participant: u8,
    pub sequence: u64,
    pub participant_time_usec: u64,
}

/// One fully-assembled outgoing record, ready for `Publisher::send`.
#[derive(Debug, Clone, Serialize)]
pub struct WireRecord<T: Serialize> {
    pub perf: PerfHeader,
    pub opra: OpraHeader,
    pub topic: String,
    pub payload: T,
    pub update_flags: UpdateFlags,
}

impl<T: Serialize> WireRecord<T> {
    /// Serializes the record to bytes for `Publisher::send`.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LastSalePayload {
    pub session: u8,
    pub opening_price: i64,
    pub daily_low: i64,
    pub daily_high: i64,
    pub cum_volume: u64,
    pub cum_value: u64,
    pub trade_price: i64,
    pub trade_volume: u32,
    pub unhalt_time_usec: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenInterestPayload {
    pub exp_year: u8,
    pub exp_month: u8,
    pub exp_day: u8,
    pub open_interest: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EodPayload {
    pub bid: i64,
    pub offer: i64,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub last: i64,
    pub close: i64,
    pub net_change: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotePayload {
    pub session: u8,
    pub opening_bid: i64,
    pub opening_offer: i64,
    pub bid_price: i64,
    pub offer_price: i64,
    pub halt_time_usec: u64,
    pub bbo_bid_participant: Option<u8>,
    pub bbo_offer_participant: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnderlyingPayload {
    pub symbol: String,
    pub last_price: Option<i64>,
    pub bid_price: Option<i64>,
    pub offer_price: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlPayload {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminPayload {
    pub body: String,
}

//! Category `Y` — underlying value (spec.md §4.4 table): "last_price
//! (change-detected) or bid/offer (change-detected), iterated over
//! embedded index group".
//!
//! Underlyings are indices/equities, not listed options, so they are not
//! kept in the [`crate::table::OptionTable`]; the embedding process
//! holds one [`UnderlyingState`] per underlying symbol.

use crate::processor::records::UnderlyingPayload;

/// Per-underlying-symbol cached state, change-detected field by field.
#[derive(Debug, Clone, Default)]
pub struct UnderlyingState {
    pub symbol: String,
    pub last_price: Option<i64>,
    pub bid_price: Option<i64>,
    pub offer_price: Option<i64>,
}

impl UnderlyingState {
    pub fn new(symbol: impl Into<String>) -> Self {
        UnderlyingState { symbol: symbol.into(), ..Default::default() }
    }
}

/// One entry of the embedded index group: either a last-sale update or a
/// bid/offer update for one underlying symbol.
#[derive(Debug, Clone, Copy)]
pub enum IndexUpdate {
    LastPrice(i64),
    BidOffer(i64, i64),
}

/// Applies one index-group entry, returning `Some(payload)` only if a
/// field actually changed (spec.md §4.4 "change-detected").
pub fn apply(state: &mut UnderlyingState, update: IndexUpdate) -> Option<UnderlyingPayload> {
    let changed = match update {
        IndexUpdate::LastPrice(p) => {
            if state.last_price != Some(p) {
                state.last_price = Some(p);
                true
            } else {
                false
            }
        }
        IndexUpdate::BidOffer(bid, offer) => {
            let c = state.bid_price != Some(bid) || state.offer_price != Some(offer);
            state.bid_price = Some(bid);
            state.offer_price = Some(offer);
            c
        }
    };

    changed.then(|| UnderlyingPayload {
        symbol: state.symbol.clone(),
        last_price: state.last_price,
        bid_price: state.bid_price,
        offer_price: state.offer_price,
    })
}

/// Applies an embedded index group (spec.md §4.4: "iterated over
/// embedded index group"), returning only the entries that changed.
pub fn apply_group(states: &mut [UnderlyingState], updates: &[(usize, IndexUpdate)]) -> Vec<UnderlyingPayload> {
    let mut out = Vec::new();
    for &(idx, update) in updates {
        if let Some(state) = states.get_mut(idx) {
            if let Some(payload) = apply(state, update) {
                out.push(payload);
            }
        }
    }
    out
}

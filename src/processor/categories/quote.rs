//! Category `k` — equity/index quote with size (spec.md §4.4 table), with
//! the four-way BBO-indicator sub-dispatch.

use crate::processor::records::QuotePayload;
use crate::table::{OptionEntry, UpdateFlags};

/// Message type carrying a halt (spec.md §4.4: "halt-time on type `T`").
pub const TYPE_HALT: u8 = b'T';

/// The BBO indicator selects which of best-bid/best-offer participant
/// identifiers ride along with the quote (spec.md §4.4 "BBO-indicator
/// sub-dispatch").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BboIndicator {
    /// Quote only: neither best-bid nor best-offer participant present.
    QuoteOnly,
    /// Quote plus a best-offer participant appendage.
    WithBestOffer,
    /// Quote plus a best-bid participant appendage.
    WithBestBid,
    /// Quote plus both best-bid and best-offer participants.
    WithBoth,
}

impl BboIndicator {
    /// OPRA's single-ASCII-character encoding of the four classes.
    pub fn from_wire(c: u8) -> Self {
        match c {
            b'1' => BboIndicator::WithBestOffer,
            b'2' => BboIndicator::WithBestBid,
            b'3' => BboIndicator::WithBoth,
            _ => BboIndicator::QuoteOnly,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn apply(
    entry: &mut OptionEntry,
    msg_type: u8,
    session: u8,
    bid_price: i64,
    offer_price: i64,
    bbo: BboIndicator,
    bbo_bid_participant: u8,
    bbo_offer_participant: u8,
    halt_time_usec: u64,
) -> QuotePayload {
    if entry.session != session {
        entry.session = session;
        entry.update_flags |= UpdateFlags::SESSION;
    }

    if entry.opening_bid == 0 && bid_price != 0 {
        entry.opening_bid = bid_price;
        entry.update_flags |= UpdateFlags::OPEN_BID;
    }
    if entry.opening_offer == 0 && offer_price != 0 {
        entry.opening_offer = offer_price;
        entry.update_flags |= UpdateFlags::OPEN_OFFER;
    }

    entry.bid_price = bid_price;
    entry.update_flags |= UpdateFlags::BID;
    entry.offer_price = offer_price;
    entry.update_flags |= UpdateFlags::OFFER;

    let (bid_participant, offer_participant) = match bbo {
        BboIndicator::QuoteOnly => (None, None),
        BboIndicator::WithBestOffer => (None, Some(bbo_offer_participant)),
        BboIndicator::WithBestBid => (Some(bbo_bid_participant), None),
        BboIndicator::WithBoth => (Some(bbo_bid_participant), Some(bbo_offer_participant)),
    };
    if let Some(p) = bid_participant {
        entry.bbo_bid_participant = p;
        entry.update_flags |= UpdateFlags::BBO_BID_PART;
    }
    if let Some(p) = offer_participant {
        entry.bbo_offer_participant = p;
        entry.update_flags |= UpdateFlags::BBO_OFFER_PART;
    }

    if msg_type == TYPE_HALT {
        entry.halt_time_usec = halt_time_usec;
        entry.update_flags |= UpdateFlags::HALT_TIME;
    }
    entry.initialized = true;

    QuotePayload {
        session: entry.session,
        opening_bid: entry.opening_bid,
        opening_offer: entry.opening_offer,
        bid_price: entry.bid_price,
        offer_price: entry.offer_price,
        halt_time_usec: entry.halt_time_usec,
        bbo_bid_participant: bid_participant,
        bbo_offer_participant: offer_participant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::key::OptionKey;

    fn fresh_entry() -> OptionEntry {
        let key = OptionKey::new(b"MSFT", 25, 1, 17, b'C', b'N', 300, 0);
        OptionEntry::new(key, 0, String::new())
    }

    #[test]
    fn scenario5_quote_update_with_derived_state() {
        let mut e = fresh_entry();
        e.begin_update(UpdateFlags::empty());
        let payload = apply(&mut e, b'Q', b'F', 1250, 1260, BboIndicator::QuoteOnly, 0, 0, 0);
        assert_eq!(payload.opening_bid, 1250);
        assert_eq!(payload.opening_offer, 1260);
        assert_eq!(payload.session, b'F');
        assert!(e.update_flags.contains(UpdateFlags::OPEN_BID));
        assert!(e.update_flags.contains(UpdateFlags::OPEN_OFFER));
        assert!(e.update_flags.contains(UpdateFlags::SESSION));
    }

    #[test]
    fn bbo_with_both_sets_both_participants() {
        let mut e = fresh_entry();
        e.begin_update(UpdateFlags::empty());
        apply(&mut e, b'Q', b'F', 100, 110, BboIndicator::WithBoth, b'A', b'B', 0);
        assert_eq!(e.bbo_bid_participant, b'A');
        assert_eq!(e.bbo_offer_participant, b'B');
        assert!(e.update_flags.contains(UpdateFlags::BBO_BID_PART));
        assert!(e.update_flags.contains(UpdateFlags::BBO_OFFER_PART));
    }

    #[test]
    fn quote_only_sets_neither_participant() {
        let mut e = fresh_entry();
        e.begin_update(UpdateFlags::empty());
        apply(&mut e, b'Q', b'F', 100, 110, BboIndicator::QuoteOnly, b'A', b'B', 0);
        assert!(!e.update_flags.contains(UpdateFlags::BBO_BID_PART));
        assert!(!e.update_flags.contains(UpdateFlags::BBO_OFFER_PART));
    }

    #[test]
    fn halt_type_sets_halt_time() {
        let mut e = fresh_entry();
        e.begin_update(UpdateFlags::empty());
        apply(&mut e, TYPE_HALT, b'F', 100, 110, BboIndicator::QuoteOnly, 0, 0, 42);
        assert_eq!(e.halt_time_usec, 42);
        assert!(e.update_flags.contains(UpdateFlags::HALT_TIME));
    }
}

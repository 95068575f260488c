//! Category `f` — end-of-day summary (spec.md §4.4 table): "bid, offer,
//! open, high, low, last, close, net_change (change-detected)".

use crate::processor::records::EodPayload;
use crate::table::{OptionEntry, UpdateFlags};

#[allow(clippy::too_many_arguments)]
pub fn apply(
    entry: &mut OptionEntry,
    bid: i64,
    offer: i64,
    open: i64,
    high: i64,
    low: i64,
    last: i64,
    close: i64,
) -> EodPayload {
    let net_change = close - entry.closing_price;

    set_if_changed(&mut entry.bid_price, bid, UpdateFlags::BID, &mut entry.update_flags);
    set_if_changed(&mut entry.offer_price, offer, UpdateFlags::OFFER, &mut entry.update_flags);
    set_if_changed(&mut entry.opening_price, open, UpdateFlags::OPEN_PRICE, &mut entry.update_flags);
    set_if_changed(&mut entry.eod_high, high, UpdateFlags::DAILY_HIGH, &mut entry.update_flags);
    set_if_changed(&mut entry.eod_low, low, UpdateFlags::DAILY_LOW, &mut entry.update_flags);
    set_if_changed(&mut entry.last_price, last, UpdateFlags::LAST_PRICE, &mut entry.update_flags);

    if entry.closing_price != close {
        entry.closing_price = close;
        entry.update_flags |= UpdateFlags::CLOSE_PRICE | UpdateFlags::NET_CHANGE;
    }
    entry.initialized = true;

    EodPayload { bid, offer, open, high, low, last, close, net_change }
}

fn set_if_changed(field: &mut i64, new: i64, flag: UpdateFlags, flags: &mut UpdateFlags) {
    if *field != new {
        *field = new;
        *flags |= flag;
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
    fn unchanged_fields_do_not_set_flags() {
        let mut e = fresh_entry();
        e.begin_update(UpdateFlags::empty());
        apply(&mut e, 100, 110, 105, 120, 95, 108, 108);
        e.begin_update(UpdateFlags::empty());
        let payload = apply(&mut e, 100, 110, 105, 120, 95, 108, 108);
        assert_eq!(payload.net_change, 0);
        assert!(e.update_flags.is_empty());
    }

    #[test]
    fn net_change_reflects_close_delta() {
        let mut e = fresh_entry();
        e.begin_update(UpdateFlags::empty());
        apply(&mut e, 100, 110, 105, 120, 95, 108, 108);
        e.begin_update(UpdateFlags::empty());
        let payload = apply(&mut e, 100, 110, 105, 125, 95, 112, 112);
        assert_eq!(payload.net_change, 4);
        assert!(e.update_flags.contains(UpdateFlags::NET_CHANGE));
    }
}

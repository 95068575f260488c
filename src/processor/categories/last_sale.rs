//! Category `a` — last sale (spec.md §4.4 table).

use crate::processor::records::LastSalePayload;
use crate::table::{OptionEntry, UpdateFlags};

/// Message type carrying an unhalt (spec.md §4.4: "sets unhalt-time on
/// type `J`").
pub const TYPE_UNHALT: u8 = b'J';

/// Applies a decoded last-sale message to `entry`, mutating its derived
/// state in place and returning the outgoing payload. Caller has already
/// called `entry.begin_update(baseline)`.
pub fn apply(
    entry: &mut OptionEntry,
    msg_type: u8,
    session: u8,
    trade_price: i64,
    trade_volume: u32,
    unhalt_time_usec: u64,
) -> LastSalePayload {
    if entry.session != session {
        entry.session = session;
        entry.update_flags |= UpdateFlags::SESSION;
    }

    if entry.opening_price == 0 && trade_price != 0 {
        entry.opening_price = trade_price;
        entry.update_flags |= UpdateFlags::OPEN_PRICE;
    }

    if entry.daily_low == 0 || trade_price < entry.daily_low {
        entry.daily_low = trade_price;
        entry.update_flags |= UpdateFlags::DAILY_LOW;
    }
    if trade_price > entry.daily_high {
        entry.daily_high = trade_price;
        entry.update_flags |= UpdateFlags::DAILY_HIGH;
    }

    entry.last_price = trade_price;
    entry.update_flags |= UpdateFlags::LAST_PRICE;

    entry.cum_volume += trade_volume as u64;
    entry.update_flags |= UpdateFlags::CUM_VOLUME;

    entry.cum_value += (trade_price.unsigned_abs()) * trade_volume as u64;
    entry.update_flags |= UpdateFlags::CUM_VALUE;

    if msg_type == TYPE_UNHALT {
        entry.unhalt_time_usec = unhalt_time_usec;
        entry.update_flags |= UpdateFlags::UNHALT_TIME;
    }

    entry.initialized = true;

    LastSalePayload {
        session: entry.session,
        opening_price: entry.opening_price,
        daily_low: entry.daily_low,
        daily_high: entry.daily_high,
        cum_volume: entry.cum_volume,
        cum_value: entry.cum_value,
        trade_price,
        trade_volume,
        unhalt_time_usec: entry.unhalt_time_usec,
    }
}

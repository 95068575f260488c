//! Category `d` — open interest (spec.md §4.4 table): "year/date/
//! participant on first sighting only".

use crate::processor::records::OpenInterestPayload;
use crate::table::{OptionEntry, UpdateFlags};

/// Applies a decoded open-interest message. Year/date/participant fields
/// are latched once, on the entry's first observation; later messages
/// only update `open_interest` itself.
pub fn apply(
    entry: &mut OptionEntry,
    participant: u8,
    exp_year: u8,
    exp_month: u8,
    exp_day: u8,
    open_interest: u32,
) -> OpenInterestPayload {
    if !entry.initialized {
        entry.last_participant = participant;
        entry.exp_raw = [exp_year, exp_month, exp_day, 0, 0, 0];
        entry.update_flags |= UpdateFlags::PARTICIPANT | UpdateFlags::YEAR | UpdateFlags::EXPIRATION;
        entry.initialized = true;
    }

    if entry.open_interest != open_interest {
        entry.open_interest = open_interest;
        entry.update_flags |= UpdateFlags::OPEN_INTEREST;
    }

    OpenInterestPayload {
        exp_year: entry.exp_raw[0],
        exp_month: entry.exp_raw[1],
        exp_day: entry.exp_raw[2],
        open_interest: entry.open_interest,
    }
}

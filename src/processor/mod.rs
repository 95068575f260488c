//! C4: the message processor (spec.md §4.4) — per-category handlers that
//! update option-state, compute derived fields, set partial-publish
//! flags, and emit normalized records.

pub mod categories;
pub mod expiry;
pub mod price;
pub mod records;

use crate::config::PartialPublish;
use crate::error::WireError;
use crate::listed::ListedOptionDirectory;
use crate::publisher::Publisher;
use crate::stats::FeedStats;
use crate::table::key::OptionKey;
use crate::table::{OptionTable, UpdateFlags};
use categories::quote::BboIndicator;
use records::{OpraHeader, PerfHeader, WireRecord};

/// Selects the update-flags baseline a handler starts from (spec.md §6
/// `partial_publish`).
pub fn baseline_flags(mode: PartialPublish) -> UpdateFlags {
    match mode {
        PartialPublish::All => UpdateFlags::ALL,
        PartialPublish::ValueAdded => UpdateFlags::VALUE_ADDED,
    }
}

/// Already-decoded, category-specific fields for one OPRA message. The
/// FAST decoder (C2) produces these from a packet's tag stream; this
/// enum is the seam between decode and business logic.
pub enum CategoryInput {
    LastSale {
        msg_type: u8,
        session: u8,
        trade_price_raw: i32,
        denom_code: u8,
        trade_volume: u32,
        unhalt_time_usec: u64,
    },
    OpenInterest {
        participant: u8,
        exp_year: u8,
        exp_month: u8,
        exp_day: u8,
        open_interest: u32,
    },
    Eod {
        bid_raw: i32,
        offer_raw: i32,
        open_raw: i32,
        high_raw: i32,
        low_raw: i32,
        last_raw: i32,
        close_raw: i32,
        denom_code: u8,
    },
    Quote {
        msg_type: u8,
        session: u8,
        bid_raw: i32,
        offer_raw: i32,
        denom_code: u8,
        bbo: BboIndicator,
        bbo_bid_participant: u8,
        bbo_offer_participant: u8,
        halt_time_usec: u64,
    },
}

/// Context threaded through every `process_*` call: process id for the
/// performance header, and the configured partial-publish baseline.
pub struct ProcessorContext {
    pub process_id: u32,
    pub partial_publish: PartialPublish,
}

/// Looks up or creates the option entry for `key`, registers its topic
/// with `publisher` on creation, and returns its handle (spec.md §4.1
/// "insert... registered with the external publisher").
fn resolve_entry(
    table: &mut OptionTable,
    key: OptionKey,
    ftline: u16,
    topic: &str,
    directory: &dyn ListedOptionDirectory,
    publisher: &mut dyn Publisher,
) -> Result<crate::table::OptionHandle, WireError> {
    if let Some(handle) = table.lookup(&key) {
        return Ok(handle);
    }
    let handle = table.insert(key, ftline, topic.to_string(), directory)?;
    let token = publisher.register_topic(topic);
    table.get_mut(handle).publisher_token = Some(token);
    Ok(handle)
}

/// Processes one decoded option-keyed message end to end: resolves the
/// option entry, applies the option-level duplicate/supersede check
/// (spec.md §4.4 "Duplicate detection at the option level"), dispatches
/// to the category handler, and publishes the resulting record.
#[allow(clippy::too_many_arguments)]
pub fn process_option_message(
    ctx: &ProcessorContext,
    table: &mut OptionTable,
    directory: &dyn ListedOptionDirectory,
    stats: &FeedStats,
    key: OptionKey,
    ftline: u16,
    topic: &str,
    category: u8,
    participant: u8,
    sequence: u64,
    participant_time_usec: u64,
    generation_time_usec: u64,
    input: CategoryInput,
    publisher: &mut dyn Publisher,
) -> Result<(), WireError> {
    let handle = resolve_entry(table, key, ftline, topic, directory, publisher)?;
    let entry = table.get_mut(handle);

    // Defense-in-depth over C3 (spec.md §4.4 "Duplicate detection at the
    // option level"): a B-side recovery for a sequence the A-side has
    // already updated the entry past is dropped without mutation.
    if entry.initialized && (sequence as u32) < entry.last_seq_num {
        FeedStats::incr(&stats.option_level_superseded);
        return Ok(());
    }

    let baseline = baseline_flags(ctx.partial_publish);
    entry.begin_update(baseline);

    let msg_type;
    let bytes = match input {
        CategoryInput::LastSale { msg_type: mt, session, trade_price_raw, denom_code, trade_volume, unhalt_time_usec } => {
            msg_type = mt;
            let trade_price = price::normalize(trade_price_raw, denom_code);
            let payload = categories::last_sale::apply(entry, mt, session, trade_price, trade_volume, unhalt_time_usec);
            build_record(ctx, entry.topic.clone(), entry.update_flags, category, mt, participant, sequence, participant_time_usec, generation_time_usec, payload)
        }
        CategoryInput::OpenInterest { participant: p, exp_year, exp_month, exp_day, open_interest } => {
            msg_type = b'O';
            let payload = categories::open_interest::apply(entry, p, exp_year, exp_month, exp_day, open_interest);
            build_record(ctx, entry.topic.clone(), entry.update_flags, category, msg_type, participant, sequence, participant_time_usec, generation_time_usec, payload)
        }
        CategoryInput::Eod { bid_raw, offer_raw, open_raw, high_raw, low_raw, last_raw, close_raw, denom_code } => {
            msg_type = b'F';
            let payload = categories::eod::apply(
                entry,
                price::normalize(bid_raw, denom_code),
                price::normalize(offer_raw, denom_code),
                price::normalize(open_raw, denom_code),
                price::normalize(high_raw, denom_code),
                price::normalize(low_raw, denom_code),
                price::normalize(last_raw, denom_code),
                price::normalize(close_raw, denom_code),
            );
            build_record(ctx, entry.topic.clone(), entry.update_flags, category, msg_type, participant, sequence, participant_time_usec, generation_time_usec, payload)
        }
        CategoryInput::Quote { msg_type: mt, session, bid_raw, offer_raw, denom_code, bbo, bbo_bid_participant, bbo_offer_participant, halt_time_usec } => {
            msg_type = mt;
            let payload = categories::quote::apply(
                entry,
                mt,
                session,
                price::normalize(bid_raw, denom_code),
                price::normalize(offer_raw, denom_code),
                bbo,
                bbo_bid_participant,
                bbo_offer_participant,
                halt_time_usec,
            );
            build_record(ctx, entry.topic.clone(), entry.update_flags, category, mt, participant, sequence, participant_time_usec, generation_time_usec, payload)
        }
    };

    entry.last_seq_num = sequence as u32;
    entry.last_participant = participant;
    entry.last_participant_time_usec = participant_time_usec;

    publisher.send(&bytes);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_record<T: serde::Serialize>(
    ctx: &ProcessorContext,
    topic: String,
    update_flags: UpdateFlags,
    category: u8,
    msg_type: u8,
    participant: u8,
    sequence: u64,
    participant_time_usec: u64,
    generation_time_usec: u64,
    payload: T,
) -> Vec<u8> {
    let record = WireRecord {
        perf: PerfHeader {
            feed_type: b'O',
            category,
            msg_type,
            process_id: ctx.process_id,
            generation_time_usec,
            sequence_number: sequence,
        },
        opra: OpraHeader { category, msg_type, participant, sequence, participant_time_usec },
        topic,
        payload,
        update_flags,
    };
    record.to_bytes()
}

/// Publishes a category-`H` control message's body text (arbiter routing
/// happens separately via [`crate::arbiter::control_kind_for`]).
pub fn process_control(body: &str, publisher: &mut dyn Publisher) {
    let payload = categories::control::apply(body);
    publisher.send(&serde_json::to_vec(&payload).unwrap_or_default());
}

/// Publishes a category-`C` administrative message's body text.
pub fn process_admin(body: &str, publisher: &mut dyn Publisher) {
    let payload = categories::admin::apply(body);
    publisher.send(&serde_json::to_vec(&payload).unwrap_or_default());
}

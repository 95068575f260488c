//! Decodes one FAST-encoded message into a typed, category-dispatched
//! value (the seam between C2 and C4: spec.md §4.2's tag API feeding
//! spec.md §4.4's per-category handlers).

use super::templates::{self, key_fields};
use crate::fast::decoder::{DecodeError, Decoder};
use crate::processor::categories::quote::BboIndicator;
use crate::processor::categories::underlying::IndexUpdate;
use crate::processor::CategoryInput;
use crate::table::key::OptionKey;

/// One decoded message, ready for C4 dispatch.
pub enum DecodedMessage {
    Option { key: OptionKey, category: u8, participant: u8, input: CategoryInput },
    Underlying { symbol: String, update: IndexUpdate },
    Control { category: u8, msg_type: u8, body: String },
    Admin { category: u8, msg_type: u8, body: String },
}

fn decode_option_key(decoder: &mut Decoder, data: &[u8], pos: &mut usize, template_id: u8) -> Result<(OptionKey, u8), DecodeError> {
    let mut root_buf = [0u8; 8];
    let root_len = decoder.decode_str(key_fields::root(template_id), data, pos, &mut root_buf)?;
    let participant = decoder.decode_u32(key_fields::participant(template_id), data, pos)? as u8;
    let exp_year = decoder.decode_u32(key_fields::exp_year(template_id), data, pos)? as u8;
    let month_letter = decoder.decode_u32(key_fields::month_letter(template_id), data, pos)? as u8;
    let exp_day = decoder.decode_u32(key_fields::exp_day(template_id), data, pos)? as u8;
    let exchange = decoder.decode_u32(key_fields::exchange(template_id), data, pos)? as u8;
    let strike_value = decoder.decode_u32(key_fields::strike_value(template_id), data, pos)?;
    let strike_denom_code = decoder.decode_u32(key_fields::strike_denom_code(template_id), data, pos)? as u8;

    let (month, is_put) = crate::processor::expiry::parse_month_letter(month_letter).map_err(|_| DecodeError::BadTagType)?;
    let (strike_decimal, strike_fraction) =
        crate::processor::expiry::split_strike(strike_value, strike_denom_code).map_err(|_| DecodeError::BadTagType)?;
    let put_call = if is_put { b'P' } else { b'C' };

    let key = OptionKey::new(&root_buf[..root_len], exp_year, month, exp_day, put_call, exchange, strike_decimal, strike_fraction);
    Ok((key, participant))
}

/// Decodes one message starting at `*pos`, which must point just past
/// the presence map consumed by [`Decoder::begin_message`].
pub fn decode_message(decoder: &mut Decoder, data: &[u8], pos: &mut usize) -> Result<DecodedMessage, DecodeError> {
    let template_id = decoder.decode_u32(templates::TEMPLATE_ID_TAG, data, pos)? as u8;
    let category = decoder.decode_u32(templates::category_tag(template_id), data, pos)? as u8;
    let msg_type = decoder.decode_u32(templates::msg_type_tag(template_id), data, pos)? as u8;

    match template_id {
        templates::TEMPLATE_LAST_SALE => {
            let (key, participant) = decode_option_key(decoder, data, pos, template_id)?;
            use templates::last_sale::*;
            let session = decoder.decode_u32(SESSION, data, pos)? as u8;
            let trade_price_raw = decoder.decode_i32(TRADE_PRICE, data, pos)?;
            let denom_code = decoder.decode_u32(DENOM_CODE, data, pos)? as u8;
            let trade_volume = decoder.decode_u32(TRADE_VOLUME, data, pos)?;
            let unhalt_time_usec = decoder.decode_u32(UNHALT_TIME, data, pos)? as u64;
            Ok(DecodedMessage::Option {
                key,
                category,
                participant,
                input: CategoryInput::LastSale { msg_type, session, trade_price_raw, denom_code, trade_volume, unhalt_time_usec },
            })
        }
        templates::TEMPLATE_OPEN_INTEREST => {
            let (key, participant) = decode_option_key(decoder, data, pos, template_id)?;
            use templates::open_interest::*;
            let field_participant = decoder.decode_u32(PARTICIPANT, data, pos)? as u8;
            let exp_year = decoder.decode_u32(EXP_YEAR, data, pos)? as u8;
            let exp_month = decoder.decode_u32(EXP_MONTH, data, pos)? as u8;
            let exp_day = decoder.decode_u32(EXP_DAY, data, pos)? as u8;
            let open_interest = decoder.decode_u32(OPEN_INTEREST, data, pos)?;
            Ok(DecodedMessage::Option {
                key,
                category,
                participant,
                input: CategoryInput::OpenInterest { participant: field_participant, exp_year, exp_month, exp_day, open_interest },
            })
        }
        templates::TEMPLATE_EOD => {
            let (key, participant) = decode_option_key(decoder, data, pos, template_id)?;
            use templates::eod::*;
            let denom_code = decoder.decode_u32(DENOM_CODE, data, pos)? as u8;
            let bid_raw = decoder.decode_i32(BID, data, pos)?;
            let offer_raw = decoder.decode_i32(OFFER, data, pos)?;
            let open_raw = decoder.decode_i32(OPEN, data, pos)?;
            let high_raw = decoder.decode_i32(HIGH, data, pos)?;
            let low_raw = decoder.decode_i32(LOW, data, pos)?;
            let last_raw = decoder.decode_i32(LAST, data, pos)?;
            let close_raw = decoder.decode_i32(CLOSE, data, pos)?;
            Ok(DecodedMessage::Option {
                key,
                category,
                participant,
                input: CategoryInput::Eod { bid_raw, offer_raw, open_raw, high_raw, low_raw, last_raw, close_raw, denom_code },
            })
        }
        templates::TEMPLATE_QUOTE => {
            let (key, participant) = decode_option_key(decoder, data, pos, template_id)?;
            use templates::quote::*;
            let session = decoder.decode_u32(SESSION, data, pos)? as u8;
            let denom_code = decoder.decode_u32(DENOM_CODE, data, pos)? as u8;
            let bid_raw = decoder.decode_i32(BID, data, pos)?;
            let offer_raw = decoder.decode_i32(OFFER, data, pos)?;
            let bbo = BboIndicator::from_wire(decoder.decode_u32(BBO_INDICATOR, data, pos)? as u8);
            let bbo_bid_participant = decoder.decode_u32(BBO_BID_PARTICIPANT, data, pos)? as u8;
            let bbo_offer_participant = decoder.decode_u32(BBO_OFFER_PARTICIPANT, data, pos)? as u8;
            let halt_time_usec = decoder.decode_u32(HALT_TIME, data, pos)? as u64;
            Ok(DecodedMessage::Option {
                key,
                category,
                participant,
                input: CategoryInput::Quote {
                    msg_type,
                    session,
                    bid_raw,
                    offer_raw,
                    denom_code,
                    bbo,
                    bbo_bid_participant,
                    bbo_offer_participant,
                    halt_time_usec,
                },
            })
        }
        templates::TEMPLATE_UNDERLYING => {
            use templates::underlying::*;
            let mut symbol_buf = [0u8; 8];
            let n = decoder.decode_str(SYMBOL, data, pos, &mut symbol_buf)?;
            let symbol = String::from_utf8_lossy(&symbol_buf[..n]).into_owned();
            let has_bid_offer = decoder.decode_u32(HAS_BID_OFFER, data, pos)? != 0;
            let update = if has_bid_offer {
                let bid = decoder.decode_i32(BID, data, pos)?;
                let offer = decoder.decode_i32(OFFER, data, pos)?;
                IndexUpdate::BidOffer(bid as i64, offer as i64)
            } else {
                let last = decoder.decode_i32(LAST_PRICE, data, pos)?;
                IndexUpdate::LastPrice(last as i64)
            };
            Ok(DecodedMessage::Underlying { symbol, update })
        }
        templates::TEMPLATE_CONTROL => {
            let mut buf = [0u8; 64];
            let n = decoder.decode_str(templates::body_text::CONTROL_BODY, data, pos, &mut buf)?;
            Ok(DecodedMessage::Control { category, msg_type, body: String::from_utf8_lossy(&buf[..n]).into_owned() })
        }
        templates::TEMPLATE_ADMIN => {
            let mut buf = [0u8; 64];
            let n = decoder.decode_str(templates::body_text::ADMIN_BODY, data, pos, &mut buf)?;
            Ok(DecodedMessage::Admin { category, msg_type, body: String::from_utf8_lossy(&buf[..n]).into_owned() })
        }
        _ => Err(DecodeError::BadTagType),
    }
}

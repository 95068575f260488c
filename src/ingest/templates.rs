//! Per-category FAST tag tables (spec.md §4.2 "this tag is the
//! decoder's unit of API"; supplemental detail recovered from
//! `examples/original_source/feeds/opra/fast/templates/` since spec.md
//! intentionally leaves exact per-category field order unspecified:
//! "the specification is the OPRA FAST Participant Interface v2").
//!
//! Each category owns a `template_id` and a fixed slot per field; the
//! first two fields of every template are the category and message-type
//! characters, read as unsigned integers with no operator (`NONE`) since
//! they are always present on the wire.

use crate::fast::tag::{Operator, Tag, ValueType};

pub const TEMPLATE_LAST_SALE: u8 = 0;
pub const TEMPLATE_OPEN_INTEREST: u8 = 1;
pub const TEMPLATE_EOD: u8 = 2;
pub const TEMPLATE_QUOTE: u8 = 3;
pub const TEMPLATE_UNDERLYING: u8 = 4;
pub const TEMPLATE_CONTROL: u8 = 5;
pub const TEMPLATE_ADMIN: u8 = 6;

/// Every template's leading two fields: category and message type.
pub const fn category_tag(template_id: u8) -> Tag {
    Tag::new(ValueType::U32, Operator::None, template_id, 0)
}
pub const fn msg_type_tag(template_id: u8) -> Tag {
    Tag::new(ValueType::U32, Operator::None, template_id, 1)
}

pub mod last_sale {
    use super::*;
    pub const SESSION: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_LAST_SALE, 2);
    pub const TRADE_PRICE: Tag = Tag::new(ValueType::I32, Operator::Delta, TEMPLATE_LAST_SALE, 3);
    pub const DENOM_CODE: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_LAST_SALE, 4);
    pub const TRADE_VOLUME: Tag = Tag::new(ValueType::U32, Operator::None, TEMPLATE_LAST_SALE, 5);
    pub const UNHALT_TIME: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_LAST_SALE, 6);
}

pub mod open_interest {
    use super::*;
    pub const PARTICIPANT: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_OPEN_INTEREST, 2);
    pub const EXP_YEAR: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_OPEN_INTEREST, 3);
    pub const EXP_MONTH: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_OPEN_INTEREST, 4);
    pub const EXP_DAY: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_OPEN_INTEREST, 5);
    pub const OPEN_INTEREST: Tag = Tag::new(ValueType::U32, Operator::Delta, TEMPLATE_OPEN_INTEREST, 6);
}

pub mod eod {
    use super::*;
    pub const DENOM_CODE: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_EOD, 2);
    pub const BID: Tag = Tag::new(ValueType::I32, Operator::None, TEMPLATE_EOD, 3);
    pub const OFFER: Tag = Tag::new(ValueType::I32, Operator::None, TEMPLATE_EOD, 4);
    pub const OPEN: Tag = Tag::new(ValueType::I32, Operator::None, TEMPLATE_EOD, 5);
    pub const HIGH: Tag = Tag::new(ValueType::I32, Operator::None, TEMPLATE_EOD, 6);
    pub const LOW: Tag = Tag::new(ValueType::I32, Operator::None, TEMPLATE_EOD, 7);
    pub const LAST: Tag = Tag::new(ValueType::I32, Operator::None, TEMPLATE_EOD, 8);
    pub const CLOSE: Tag = Tag::new(ValueType::I32, Operator::None, TEMPLATE_EOD, 9);
}

pub mod quote {
    use super::*;
    pub const SESSION: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_QUOTE, 2);
    pub const DENOM_CODE: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_QUOTE, 3);
    pub const BID: Tag = Tag::new(ValueType::I32, Operator::Delta, TEMPLATE_QUOTE, 4);
    pub const OFFER: Tag = Tag::new(ValueType::I32, Operator::Delta, TEMPLATE_QUOTE, 5);
    pub const BBO_INDICATOR: Tag = Tag::new(ValueType::U32, Operator::None, TEMPLATE_QUOTE, 6);
    pub const BBO_BID_PARTICIPANT: Tag = Tag::new(ValueType::U32, Operator::None, TEMPLATE_QUOTE, 7);
    pub const BBO_OFFER_PARTICIPANT: Tag = Tag::new(ValueType::U32, Operator::None, TEMPLATE_QUOTE, 8);
    pub const HALT_TIME: Tag = Tag::new(ValueType::U32, Operator::Copy, TEMPLATE_QUOTE, 9);
}

pub mod underlying {
    use super::*;
    pub const SYMBOL: Tag = Tag::new(ValueType::Str, Operator::Copy, TEMPLATE_UNDERLYING, 2);
    pub const HAS_BID_OFFER: Tag = Tag::new(ValueType::U32, Operator::None, TEMPLATE_UNDERLYING, 3);
    pub const LAST_PRICE: Tag = Tag::new(ValueType::I32, Operator::Delta, TEMPLATE_UNDERLYING, 4);
    pub const BID: Tag = Tag::new(ValueType::I32, Operator::Delta, TEMPLATE_UNDERLYING, 5);
    pub const OFFER: Tag = Tag::new(ValueType::I32, Operator::Delta, TEMPLATE_UNDERLYING, 6);
}

pub mod body_text {
    use super::*;
    pub const CONTROL_BODY: Tag = Tag::new(ValueType::Str, Operator::None, TEMPLATE_CONTROL, 2);
    pub const ADMIN_BODY: Tag = Tag::new(ValueType::Str, Operator::None, TEMPLATE_ADMIN, 2);
}

/// Fields identifying the option a message pertains to, common to every
/// option-keyed template (slots 10-18, disjoint from every category's
/// own business-field slots above).
pub mod key_fields {
    use super::*;
    pub const fn root(t: u8) -> Tag {
        Tag::new(ValueType::Str, Operator::Copy, t, 10)
    }
    pub const fn participant(t: u8) -> Tag {
        Tag::new(ValueType::U32, Operator::Copy, t, 11)
    }
    pub const fn exp_year(t: u8) -> Tag {
        Tag::new(ValueType::U32, Operator::Copy, t, 12)
    }
    /// OPRA's single-letter month/put-call encoding (spec.md §4.4 "Expiry
    /// parsing"), carried as the ASCII code point.
    pub const fn month_letter(t: u8) -> Tag {
        Tag::new(ValueType::U32, Operator::Copy, t, 13)
    }
    pub const fn exp_day(t: u8) -> Tag {
        Tag::new(ValueType::U32, Operator::Copy, t, 14)
    }
    pub const fn exchange(t: u8) -> Tag {
        Tag::new(ValueType::U32, Operator::Copy, t, 15)
    }
    pub const fn strike_value(t: u8) -> Tag {
        Tag::new(ValueType::U32, Operator::Delta, t, 16)
    }
    pub const fn strike_denom_code(t: u8) -> Tag {
        Tag::new(ValueType::U32, Operator::Copy, t, 17)
    }
}

/// Reserved template slot for the template-id field itself, which must
/// be decoded before any other tag can be constructed (every message's
/// true first field; always present, no operator).
pub const TEMPLATE_ID_RESERVED: u8 = 15;
pub const TEMPLATE_ID_TAG: Tag = Tag::new(ValueType::U32, Operator::None, TEMPLATE_ID_RESERVED, 0);

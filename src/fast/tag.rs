//! The FAST decoder's tag word: `(type, operator, template_id, slot_index)`
//! packed into a single `u32` constant, per spec.md §4.2 ("this tag is the
//! decoder's unit of API").

/// The three value types this decoder subset understands (spec.md §4.2
/// "Scope": decimal and group/sequence templates are not implemented).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    U32,
    I32,
    Str,
}

/// The four FAST operators this decoder subset implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    None,
    Copy,
    Incr,
    Delta,
}

const SHIFT_SLOT: u32 = 0;
const SHIFT_TID: u32 = 12;
const SHIFT_OP: u32 = 24;
const SHIFT_TYPE: u32 = 28;

const MASK_SLOT: u32 = 0xfff;
const MASK_TID: u32 = 0xf;
const MASK_OP: u32 = 0xf;
const MASK_TYPE: u32 = 0xf;

/// Opaque 32-bit tag identifying a field's type, operator, and cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag(u32);

impl Tag {
    /// Packs `(type, operator, template_id, slot_index)` into a tag
    /// constant, mirroring the original `MAKE_TAG` macro's field layout
    /// (see `examples/original_source/feeds/opra/fast/codec/fast_api.h`).
    pub const fn new(ty: ValueType, op: Operator, template_id: u8, slot: u16) -> Self {
        let ty_bits = match ty {
            ValueType::U32 => 0u32,
            ValueType::I32 => 1u32,
            ValueType::Str => 2u32,
        };
        let op_bits = match op {
            Operator::None => 0u32,
            Operator::Copy => 1u32,
            Operator::Incr => 2u32,
            Operator::Delta => 3u32,
        };
        Tag((ty_bits << SHIFT_TYPE)
            | (op_bits << SHIFT_OP)
            | (((template_id as u32) & MASK_TID) << SHIFT_TID)
            | ((slot as u32) & MASK_SLOT))
    }

    pub fn value_type(self) -> ValueType {
        match (self.0 >> SHIFT_TYPE) & MASK_TYPE {
            0 => ValueType::U32,
            1 => ValueType::I32,
            _ => ValueType::Str,
        }
    }

    pub fn operator(self) -> Operator {
        match (self.0 >> SHIFT_OP) & MASK_OP {
            0 => Operator::None,
            1 => Operator::Copy,
            2 => Operator::Incr,
            _ => Operator::Delta,
        }
    }

    pub fn template_id(self) -> u8 {
        ((self.0 >> SHIFT_TID) & MASK_TID) as u8
    }

    pub fn slot(self) -> u16 {
        (self.0 & MASK_SLOT) as u16
    }

    /// Flat index into the decoder's `(template_id, slot_index)` cache
    /// array (spec.md §4.2 "State").
    pub fn cv_index(self, slots_per_template: u16) -> usize {
        self.template_id() as usize * slots_per_template as usize + self.slot() as usize
    }
}

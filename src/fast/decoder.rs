//! C2: the stateful tag/operator/presence-map FAST decoder (spec.md §4.2).

use crate::fast::presence_map::PresenceMap;
use crate::fast::tag::{Operator, Tag, ValueType};
use std::fmt;

/// Number of per-template cache slots. OPRA templates carry well under 64
/// distinct COPY/INCR/DELTA fields each.
pub const SLOTS_PER_TEMPLATE: u16 = 64;
/// Number of templates tracked (categories `a,d,f,k,Y,H,C` plus headroom).
pub const MAX_TEMPLATES: u8 = 16;

/// Errors a single decode call can raise (spec.md §4.2 "API contract").
/// All are packet-local: the decoder retains its cached-value state across
/// packets (spec.md §4.2 "Failure policy").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The tag's declared type disagrees with the call made (`decode_u32`
    /// on an `I32`/`Str` tag, etc).
    BadTagType,
    /// The operator is not supported for this call.
    BadOp,
    /// The field was absent and no previous value could satisfy the
    /// operator (or a `NONE` field was absent).
    MissingValue,
    /// A buffer would overflow, or the packet ran out of bytes mid-field.
    Size,
    /// `end_message` before `begin_message`, or nested `begin_message`.
    CallSeq,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeError::BadTagType => "bad_tag_type",
            DecodeError::BadOp => "bad_op",
            DecodeError::MissingValue => "missing_value",
            DecodeError::Size => "size",
            DecodeError::CallSeq => "call_seq",
        };
        write!(f, "{s}")
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, Default)]
struct CachedValue {
    i32_val: i32,
    u32_val: u32,
    str_val: Vec<u8>,
    valid: bool,
}

/// Stateful FAST decoder: owns the `(template_id, slot_index)` cache and
/// the in-progress message's presence map.
pub struct Decoder {
    cv: Vec<CachedValue>,
    pmap: Option<PresenceMap>,
    field_cursor: usize,
    in_message: bool,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            cv: vec![CachedValue::default(); MAX_TEMPLATES as usize * SLOTS_PER_TEMPLATE as usize],
            pmap: None,
            field_cursor: 0,
            in_message: false,
        }
    }

    /// Reads the presence map for a new message from `data[*pos..]`.
    /// Rejects nested calls (spec.md §4.2: "rejects nested begin_message
    /// calls"). Returns the raw presence bits packed into a `u32` (bit 0 =
    /// first field), for callers that want to branch on presence before
    /// decoding (e.g. template dispatch).
    pub fn begin_message(&mut self, data: &[u8], pos: &mut usize) -> Result<u32, DecodeError> {
        if self.in_message {
            return Err(DecodeError::CallSeq);
        }
        let pmap = PresenceMap::parse(data, pos)?;
        let mut bits: u32 = 0;
        for i in 0..pmap.len().min(32) {
            if pmap.get(i) == Some(true) {
                bits |= 1 << i;
            }
        }
        self.pmap = Some(pmap);
        self.field_cursor = 0;
        self.in_message = true;
        Ok(bits)
    }

    /// Consistency check: must follow a `begin_message` with no mismatched
    /// nesting.
    pub fn end_message(&mut self) -> Result<(), DecodeError> {
        if !self.in_message {
            return Err(DecodeError::CallSeq);
        }
        self.in_message = false;
        self.pmap = None;
        Ok(())
    }

    fn next_presence_bit(&mut self) -> Result<bool, DecodeError> {
        if !self.in_message {
            return Err(DecodeError::CallSeq);
        }
        let pmap = self.pmap.as_ref().ok_or(DecodeError::CallSeq)?;
        let present = pmap.get(self.field_cursor).unwrap_or(false);
        self.field_cursor += 1;
        Ok(present)
    }

    fn slot(&mut self, tag: Tag) -> &mut CachedValue {
        &mut self.cv[tag.cv_index(SLOTS_PER_TEMPLATE)]
    }

    /// Reads a stop-bit-terminated unsigned integer: seven data bits per
    /// byte, big-endian, the final byte marked by its high bit (spec.md
    /// §4.2 "Field encoding").
    fn read_wire_u32(data: &[u8], pos: &mut usize) -> Result<u32, DecodeError> {
        let mut value: u32 = 0;
        loop {
            let byte = *data.get(*pos).ok_or(DecodeError::Size)?;
            *pos += 1;
            value = (value << 7) | (byte & 0x7f) as u32;
            if byte & 0x80 != 0 {
                break;
            }
        }
        Ok(value)
    }

    /// Same stop-bit framing as [`Self::read_wire_u32`], but sign-extends
    /// from bit 6 of the first byte (spec.md §4.2).
    fn read_wire_i32(data: &[u8], pos: &mut usize) -> Result<i32, DecodeError> {
        let start = *pos;
        let first = *data.get(*pos).ok_or(DecodeError::Size)?;
        let negative = first & 0x40 != 0;
        let raw = Self::read_wire_u32(data, pos)?;
        let nbytes = *pos - start;
        if negative {
            // Sign-extend: the value occupies 7*nbytes bits.
            let bits = 7 * nbytes as u32;
            let sign_extended = (raw as i64) - (1i64 << bits);
            Ok(sign_extended as i32)
        } else {
            Ok(raw as i32)
        }
    }

    /// Decodes an unsigned integer field.
    pub fn decode_u32(&mut self, tag: Tag, data: &[u8], pos: &mut usize) -> Result<u32, DecodeError> {
        if tag.value_type() != ValueType::U32 {
            return Err(DecodeError::BadTagType);
        }
        let present = self.next_presence_bit()?;
        let op = tag.operator();
        match op {
            Operator::None => {
                if !present {
                    return Err(DecodeError::MissingValue);
                }
                let v = Self::read_wire_u32(data, pos)?;
                Ok(v)
            }
            Operator::Copy => {
                let slot = self.slot(tag);
                if present {
                    let v = Self::read_wire_u32(data, pos)?;
                    slot.u32_val = v;
                    slot.valid = true;
                    Ok(v)
                } else if slot.valid {
                    Ok(slot.u32_val)
                } else {
                    Err(DecodeError::MissingValue)
                }
            }
            Operator::Incr => {
                let slot = self.slot(tag);
                if present {
                    let v = Self::read_wire_u32(data, pos)?;
                    slot.u32_val = v;
                    slot.valid = true;
                    Ok(v)
                } else if slot.valid {
                    slot.u32_val = slot.u32_val.wrapping_add(1);
                    Ok(slot.u32_val)
                } else {
                    Err(DecodeError::MissingValue)
                }
            }
            Operator::Delta => {
                let slot = self.slot(tag);
                if present {
                    let wire = Self::read_wire_u32(data, pos)?;
                    let v = if slot.valid {
                        slot.u32_val.wrapping_add(wire)
                    } else {
                        wire
                    };
                    slot.u32_val = v;
                    slot.valid = true;
                    Ok(v)
                } else if slot.valid {
                    Ok(slot.u32_val)
                } else {
                    Err(DecodeError::MissingValue)
                }
            }
        }
    }

    /// Decodes a signed integer field.
    pub fn decode_i32(&mut self, tag: Tag, data: &[u8], pos: &mut usize) -> Result<i32, DecodeError> {
        if tag.value_type() != ValueType::I32 {
            return Err(DecodeError::BadTagType);
        }
        let present = self.next_presence_bit()?;
        let op = tag.operator();
        match op {
            Operator::None => {
                if !present {
                    return Err(DecodeError::MissingValue);
                }
                Self::read_wire_i32(data, pos)
            }
            Operator::Copy => {
                let slot = self.slot(tag);
                if present {
                    let v = Self::read_wire_i32(data, pos)?;
                    slot.i32_val = v;
                    slot.valid = true;
                    Ok(v)
                } else if slot.valid {
                    Ok(slot.i32_val)
                } else {
                    Err(DecodeError::MissingValue)
                }
            }
            Operator::Incr => {
                let slot = self.slot(tag);
                if present {
                    let v = Self::read_wire_i32(data, pos)?;
                    slot.i32_val = v;
                    slot.valid = true;
                    Ok(v)
                } else if slot.valid {
                    slot.i32_val = slot.i32_val.wrapping_add(1);
                    Ok(slot.i32_val)
                } else {
                    Err(DecodeError::MissingValue)
                }
            }
            Operator::Delta => {
                let slot = self.slot(tag);
                if present {
                    let wire = Self::read_wire_i32(data, pos)?;
                    let v = if slot.valid {
                        slot.i32_val.wrapping_add(wire)
                    } else {
                        wire
                    };
                    slot.i32_val = v;
                    slot.valid = true;
                    Ok(v)
                } else if slot.valid {
                    Ok(slot.i32_val)
                } else {
                    Err(DecodeError::MissingValue)
                }
            }
        }
    }

    /// Decodes a string field into `buf`, returning the length written.
    /// Strings are stop-bit terminated per byte (high bit marks the last
    /// character); empty strings cannot be encoded (spec.md §4.2). DELTA
    /// strings carry only the changed tail and require equal total length
    /// with the previous value.
    pub fn decode_str(&mut self, tag: Tag, data: &[u8], pos: &mut usize, buf: &mut [u8]) -> Result<usize, DecodeError> {
        if tag.value_type() != ValueType::Str {
            return Err(DecodeError::BadTagType);
        }
        let present = self.next_presence_bit()?;
        let op = tag.operator();
        match op {
            Operator::None => {
                if !present {
                    return Err(DecodeError::MissingValue);
                }
                Self::read_wire_str(data, pos, buf)
            }
            Operator::Copy => {
                if present {
                    let n = Self::read_wire_str(data, pos, buf)?;
                    let slot = self.slot(tag);
                    slot.str_val = buf[..n].to_vec();
                    slot.valid = true;
                    Ok(n)
                } else {
                    let slot = self.slot(tag);
                    if !slot.valid {
                        return Err(DecodeError::MissingValue);
                    }
                    let n = slot.str_val.len();
                    if n > buf.len() {
                        return Err(DecodeError::Size);
                    }
                    buf[..n].copy_from_slice(&slot.str_val);
                    Ok(n)
                }
            }
            Operator::Incr => Err(DecodeError::BadOp),
            Operator::Delta => {
                if present {
                    let mut tail = [0u8; 256];
                    let tail_len = Self::read_wire_str(data, pos, &mut tail)?;
                    let slot = self.slot(tag);
                    let new_val = if slot.valid {
                        if tail_len > slot.str_val.len() {
                            return Err(DecodeError::Size);
                        }
                        let mut v = slot.str_val.clone();
                        let keep = v.len() - tail_len;
                        v[keep..].copy_from_slice(&tail[..tail_len]);
                        v
                    } else {
                        tail[..tail_len].to_vec()
                    };
                    if new_val.len() > buf.len() {
                        return Err(DecodeError::Size);
                    }
                    buf[..new_val.len()].copy_from_slice(&new_val);
                    let n = new_val.len();
                    let slot = self.slot(tag);
                    slot.str_val = new_val;
                    slot.valid = true;
                    Ok(n)
                } else {
                    let slot = self.slot(tag);
                    if !slot.valid {
                        return Err(DecodeError::MissingValue);
                    }
                    let n = slot.str_val.len();
                    if n > buf.len() {
                        return Err(DecodeError::Size);
                    }
                    buf[..n].copy_from_slice(&slot.str_val);
                    Ok(n)
                }
            }
        }
    }

    fn read_wire_str(data: &[u8], pos: &mut usize, buf: &mut [u8]) -> Result<usize, DecodeError> {
        let mut n = 0;
        loop {
            let byte = *data.get(*pos).ok_or(DecodeError::Size)?;
            *pos += 1;
            if n >= buf.len() {
                return Err(DecodeError::Size);
            }
            buf[n] = byte & 0x7f;
            n += 1;
            if byte & 0x80 != 0 {
                break;
            }
        }
        Ok(n)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fast::tag::{Operator, Tag, ValueType};

    fn pmap_byte(bits: &[bool]) -> u8 {
        let mut b = 0x80u8; // stop bit
        for (i, &bit) in bits.iter().enumerate().take(7) {
            if bit {
                b |= 1 << (6 - i);
            }
        }
        b
    }

    #[test]
    fn copy_absent_after_present_returns_prior() {
        let tag = Tag::new(ValueType::U32, Operator::Copy, 0, 0);
        let mut dec = Decoder::new();
        // Message 1: field present, value 7.
        let data1 = [pmap_byte(&[true]), 7 | 0x80];
        let mut pos = 0;
        dec.begin_message(&data1, &mut pos).unwrap();
        assert_eq!(dec.decode_u32(tag, &data1, &mut pos).unwrap(), 7);
        dec.end_message().unwrap();

        // Message 2: field absent -> returns prior value 7.
        let data2 = [pmap_byte(&[false])];
        let mut pos2 = 0;
        dec.begin_message(&data2, &mut pos2).unwrap();
        assert_eq!(dec.decode_u32(tag, &data2, &mut pos2).unwrap(), 7);
    }

    #[test]
    fn copy_absent_with_no_prior_is_missing_value() {
        let tag = Tag::new(ValueType::U32, Operator::Copy, 1, 0);
        let mut dec = Decoder::new();
        let data = [pmap_byte(&[false])];
        let mut pos = 0;
        dec.begin_message(&data, &mut pos).unwrap();
        assert_eq!(dec.decode_u32(tag, &data, &mut pos), Err(DecodeError::MissingValue));
    }

    #[test]
    fn incr_absent_yields_prior_plus_one() {
        let tag = Tag::new(ValueType::U32, Operator::Incr, 2, 0);
        let mut dec = Decoder::new();
        let data1 = [pmap_byte(&[true]), 10 | 0x80];
        let mut pos = 0;
        dec.begin_message(&data1, &mut pos).unwrap();
        assert_eq!(dec.decode_u32(tag, &data1, &mut pos).unwrap(), 10);
        dec.end_message().unwrap();

        let data2 = [pmap_byte(&[false])];
        let mut pos2 = 0;
        dec.begin_message(&data2, &mut pos2).unwrap();
        assert_eq!(dec.decode_u32(tag, &data2, &mut pos2).unwrap(), 11);
    }

    #[test]
    fn delta_establishes_baseline_then_adds_wire_value() {
        let tag = Tag::new(ValueType::I32, Operator::Delta, 3, 0);
        let mut dec = Decoder::new();
        let data1 = [pmap_byte(&[true]), 5 | 0x80];
        let mut pos = 0;
        dec.begin_message(&data1, &mut pos).unwrap();
        assert_eq!(dec.decode_i32(tag, &data1, &mut pos).unwrap(), 5);
        dec.end_message().unwrap();

        let data2 = [pmap_byte(&[true]), 3 | 0x80];
        let mut pos2 = 0;
        dec.begin_message(&data2, &mut pos2).unwrap();
        assert_eq!(dec.decode_i32(tag, &data2, &mut pos2).unwrap(), 8);
    }

    #[test]
    fn bad_tag_type_is_rejected() {
        let tag = Tag::new(ValueType::U32, Operator::None, 4, 0);
        let mut dec = Decoder::new();
        let data = [pmap_byte(&[true]), 1 | 0x80];
        let mut pos = 0;
        dec.begin_message(&data, &mut pos).unwrap();
        assert_eq!(dec.decode_i32(tag, &data, &mut pos), Err(DecodeError::BadTagType));
    }

    #[test]
    fn nested_begin_message_is_call_seq_error() {
        let mut dec = Decoder::new();
        let data = [pmap_byte(&[true]), 1 | 0x80];
        let mut pos = 0;
        dec.begin_message(&data, &mut pos).unwrap();
        assert_eq!(dec.begin_message(&data, &mut pos), Err(DecodeError::CallSeq));
    }

    #[test]
    fn end_before_begin_is_call_seq_error() {
        let mut dec = Decoder::new();
        assert_eq!(dec.end_message(), Err(DecodeError::CallSeq));
    }

    #[test]
    fn decoder_state_survives_failed_packet() {
        let tag = Tag::new(ValueType::U32, Operator::Copy, 5, 0);
        let mut dec = Decoder::new();
        let data1 = [pmap_byte(&[true]), 99 | 0x80];
        let mut pos = 0;
        dec.begin_message(&data1, &mut pos).unwrap();
        dec.decode_u32(tag, &data1, &mut pos).unwrap();
        dec.end_message().unwrap();

        // A malformed second packet (truncated wire value) fails mid-decode...
        let data2 = [pmap_byte(&[true])];
        let mut pos2 = 0;
        dec.begin_message(&data2, &mut pos2).unwrap();
        assert!(dec.decode_u32(tag, &data2, &mut pos2).is_err());

        // ...but the cached COPY value from before is untouched.
        let mut dec2_pos = 0;
        let data3 = [pmap_byte(&[false])];
        dec.in_message = false; // simulate caller dropping the failed packet
        dec.begin_message(&data3, &mut dec2_pos).unwrap();
        assert_eq!(dec.decode_u32(tag, &data3, &mut dec2_pos).unwrap(), 99);
    }

    #[test]
    fn string_delta_replaces_only_tail() {
        let tag = Tag::new(ValueType::Str, Operator::Delta, 6, 0);
        let mut dec = Decoder::new();
        let data1 = [pmap_byte(&[true]), b'A' | 0x80, b'B' | 0x80, b'C' | 0x80];
        let mut pos = 0;
        let mut buf = [0u8; 16];
        dec.begin_message(&data1, &mut pos).unwrap();
        let n = dec.decode_str(tag, &data1, &mut pos, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"ABC");
        dec.end_message().unwrap();

        // Tail-only update: change just the last byte.
        let data2 = [pmap_byte(&[true]), b'Z' | 0x80];
        let mut pos2 = 0;
        dec.begin_message(&data2, &mut pos2).unwrap();
        let n2 = dec.decode_str(tag, &data2, &mut pos2, &mut buf).unwrap();
        assert_eq!(&buf[..n2], b"ABZ");
    }
}

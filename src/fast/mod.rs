//! C2: FAST v2 decoder subset (spec.md §4.2).

pub mod decoder;
pub mod presence_map;
pub mod tag;

pub use decoder::{DecodeError, Decoder};
pub use tag::{Operator, Tag, ValueType};

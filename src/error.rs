//! Error taxonomy (spec.md §7): fatal [`ConfigError`] at startup, and
//! per-packet [`WireError`] on the hot path. Follows the teacher's manual
//! `Display` + `std::error::Error` style rather than a derive macro.

use std::fmt;

/// Startup-only, fatal errors (spec.md §7 "Fatal" class). The embedding
/// process aborts before the ingest loop starts; there is no
/// partial-startup mode.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// `table_size` must be nonzero.
    ZeroTableSize,
    /// A/B sides of an FT line must be enabled or disabled together
    /// (spec.md §6 configuration surface).
    AsymmetricLineEnablement { ftline: u16 },
    /// `topic_fmt.stanza_list` referenced an unknown `$`-variable.
    InvalidTopicVariable { variable: char },
    /// Two configured processes claim overlapping FT-line ranges.
    OverlappingProcessLines { line: u16, process_a: usize, process_b: usize },
    /// Socket open or multicast join failed at startup.
    SocketSetup { ftline: u16, side: char, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTableSize => write!(f, "table_size must be nonzero"),
            ConfigError::AsymmetricLineEnablement { ftline } => write!(
                f,
                "FT line {ftline}: A and B sides must be enabled/disabled together"
            ),
            ConfigError::InvalidTopicVariable { variable } => {
                write!(f, "unknown topic format variable '${variable}'")
            }
            ConfigError::OverlappingProcessLines { line, process_a, process_b } => write!(
                f,
                "FT line {line} claimed by both process {process_a} and process {process_b}"
            ),
            ConfigError::SocketSetup { ftline, side, message } => write!(
                f,
                "FT line {ftline} side {side}: socket setup failed: {message}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per-packet, non-fatal errors (spec.md §7 hot-path classes). Every
/// variant is local to the packet that produced it: the ingest loop
/// increments a counter, logs, and continues (spec.md §7 "Propagation").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireError {
    /// First byte was not `0x01` (SOH).
    BadStartOfHeader,
    /// Version byte was not `2`.
    UnsupportedVersion(u8),
    /// Datagram shorter than the fixed 16-byte packet header.
    ShortPacket,
    /// FAST decoder rejected the message (see [`crate::fast::DecodeError`]).
    DecodeFailed,
    /// `OptionTable::insert` was attempted on an already-present key.
    DuplicateKey,
    /// The option-table slab is exhausted; the packet is dropped (spec.md
    /// §4.1 "Failure modes").
    TableExhausted,
    /// A strike denominator code below `'@'` was encountered; spec.md §9's
    /// Open Question resolves this as a dropped message rather than a
    /// silent negative-exponent normalization.
    InvalidDenominator,
    /// An expiry month letter outside `A..X` was encountered.
    InvalidExpiryMonth,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::BadStartOfHeader => write!(f, "packet did not start with SOH (0x01)"),
            WireError::UnsupportedVersion(v) => write!(f, "unsupported packet version {v}"),
            WireError::ShortPacket => write!(f, "packet shorter than fixed header"),
            WireError::DecodeFailed => write!(f, "FAST decode failed"),
            WireError::DuplicateKey => write!(f, "duplicate option key"),
            WireError::TableExhausted => write!(f, "option table slab exhausted"),
            WireError::InvalidDenominator => write!(f, "strike denominator code out of range"),
            WireError::InvalidExpiryMonth => write!(f, "expiry month letter out of range"),
        }
    }
}

impl std::error::Error for WireError {}

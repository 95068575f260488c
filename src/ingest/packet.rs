//! Fixed 16-byte OPRA packet header parsing (spec.md §5's wire-input
//! layout, detailed in §6 "Wire input").

use crate::error::WireError;

pub const SOH: u8 = 0x01;
pub const ETX: u8 = 0x03;
pub const SUPPORTED_VERSION: u8 = 2;
pub const HEADER_LEN: usize = 16;
/// `size_of_first_message` byte value meaning "runs to end of packet".
pub const RUNS_TO_END: u8 = 0xFF;

/// Parsed fixed header: first sequence number, message count, and where
/// the FAST-encoded message stream begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub sequence_number: u64,
    pub message_count: u16,
    pub size_of_first_message: u8,
    pub body_offset: usize,
}

/// Validates SOH/version and parses the fixed header (spec.md §6 "Wire
/// input"). Does not look past `offset 16`; the FAST decoder consumes
/// the rest.
pub fn parse_header(data: &[u8]) -> Result<PacketHeader, WireError> {
    if data.len() < HEADER_LEN {
        return Err(WireError::ShortPacket);
    }
    if data[0] != SOH {
        return Err(WireError::BadStartOfHeader);
    }
    if data[1] != SUPPORTED_VERSION {
        return Err(WireError::UnsupportedVersion(data[1]));
    }

    let sequence_number = parse_ascii_digits(&data[2..12]).ok_or(WireError::ShortPacket)?;
    let message_count = parse_ascii_digits(&data[12..15]).ok_or(WireError::ShortPacket)? as u16;

    Ok(PacketHeader {
        sequence_number,
        message_count,
        size_of_first_message: data[15],
        body_offset: HEADER_LEN,
    })
}

fn parse_ascii_digits(digits: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + (b - b'0') as u64;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_packet(sn: u64, count: u16) -> Vec<u8> {
        let mut v = vec![SOH, SUPPORTED_VERSION];
        v.extend(format!("{sn:010}").into_bytes());
        v.extend(format!("{count:03}").into_bytes());
        v.push(RUNS_TO_END);
        v.push(ETX);
        v
    }

    #[test]
    fn parses_sequence_and_count() {
        let pkt = make_packet(1234567890, 3);
        let hdr = parse_header(&pkt).unwrap();
        assert_eq!(hdr.sequence_number, 1234567890);
        assert_eq!(hdr.message_count, 3);
        assert_eq!(hdr.body_offset, HEADER_LEN);
    }

    #[test]
    fn rejects_bad_soh() {
        let mut pkt = make_packet(1, 1);
        pkt[0] = 0x02;
        assert_eq!(parse_header(&pkt), Err(WireError::BadStartOfHeader));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut pkt = make_packet(1, 1);
        pkt[1] = 3;
        assert_eq!(parse_header(&pkt), Err(WireError::UnsupportedVersion(3)));
    }

    #[test]
    fn rejects_short_packet() {
        assert_eq!(parse_header(&[SOH, SUPPORTED_VERSION]), Err(WireError::ShortPacket));
    }
}

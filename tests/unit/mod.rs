//! Crate-level integration tests spanning ingest, arbitration, and the
//! message processor end to end, driven entirely through
//! `opra_feed_core`'s public surface with synthetic wire packets.

use opra_feed_core::config::{FeedConfig, LineEndpoint, LineEndpoints, PartialPublish, TopicFormat};
use opra_feed_core::ingest::packet;
use opra_feed_core::ingest::socket::QueueDatagramSource;
use opra_feed_core::ingest::templates;
use opra_feed_core::ingest::IngestLoop;
use opra_feed_core::listed::EmptyDirectory;
use opra_feed_core::publisher::RecordingSink;

fn endpoint() -> LineEndpoint {
    LineEndpoint { enable: true, address: "224.0.1.1".into(), port: 0, interface: "0.0.0.0".into() }
}

fn one_line_config() -> FeedConfig {
    FeedConfig {
        table_size: 64,
        seq_jump_threshold: 100_000,
        jitter_stats: false,
        partial_publish: PartialPublish::ValueAdded,
        line_status_enable: false,
        line_status_period_secs: 30,
        periodic_stats: false,
        periodic_stats_interval_secs: 60,
        topic_fmt: TopicFormat { stanza_delim: '.', stanzas: vec!["OPRA".into(), "$S".into()] },
        lines: vec![LineEndpoints { a: endpoint(), b: endpoint() }],
        processes: vec![],
    }
}

fn pmap_bytes(n: usize) -> Vec<u8> {
    let bytes_needed = n.div_ceil(7).max(1);
    let mut out = vec![0x7fu8; bytes_needed];
    *out.last_mut().unwrap() |= 0x80;
    out
}

/// Encodes `v` as big-endian 7-bit stop-bit groups, the inverse of the
/// decoder's wire integer reader.
fn stop_bit_u32(mut v: u32) -> Vec<u8> {
    let mut groups = vec![(v & 0x7f) as u8];
    v >>= 7;
    while v != 0 {
        groups.push((v & 0x7f) as u8);
        v >>= 7;
    }
    groups.reverse();
    let last = groups.len() - 1;
    groups[last] |= 0x80;
    groups
}

fn stop_bit_str(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, &b) in s.iter().enumerate() {
        out.push(if i + 1 == s.len() { b | 0x80 } else { b });
    }
    out
}

fn wrap_packet(sn: u64, body: Vec<u8>) -> Vec<u8> {
    let mut pkt = vec![packet::SOH, packet::SUPPORTED_VERSION];
    pkt.extend(format!("{sn:010}").into_bytes());
    pkt.extend(format!("{:03}", 1).into_bytes());
    pkt.push(packet::RUNS_TO_END);
    pkt.extend(body);
    pkt
}

/// A category-`k` quote for `(MSFT, 25, 1, 17, C, 300, 0, N)`, the fixture
/// used throughout the processor's own unit tests.
fn quote_packet(sn: u64, bid_raw: i32, offer_raw: i32) -> Vec<u8> {
    let mut body = Vec::new();
    // 3 generic + 8 key fields + 8 quote fields = 19.
    body.extend(pmap_bytes(19));
    body.extend(stop_bit_u32(templates::TEMPLATE_QUOTE as u32));
    body.extend(stop_bit_u32(b'k' as u32));
    body.extend(stop_bit_u32(b'Q' as u32));
    body.extend(stop_bit_str(b"MSFT"));
    body.extend(stop_bit_u32(b'N' as u32)); // participant
    body.extend(stop_bit_u32(25)); // exp_year
    body.extend(stop_bit_u32(b'A' as u32)); // month letter: call, month 1
    body.extend(stop_bit_u32(17)); // exp_day
    body.extend(stop_bit_u32(b'Q' as u32)); // exchange
    body.extend(stop_bit_u32(300)); // strike value
    body.extend(stop_bit_u32(b'@' as u32)); // strike denom code
    body.extend(stop_bit_u32(b'F' as u32)); // session
    body.extend(stop_bit_u32(b'D' as u32)); // price denom code
    body.extend(stop_bit_u32(bid_raw as u32));
    body.extend(stop_bit_u32(offer_raw as u32));
    body.extend(stop_bit_u32(b'1' as u32)); // bbo indicator
    body.extend(stop_bit_u32(b'N' as u32)); // bbo bid participant
    body.extend(stop_bit_u32(0)); // bbo offer participant
    body.extend(stop_bit_u32(0)); // halt time
    wrap_packet(sn, body)
}

/// A category/msg_type pair riding `TEMPLATE_CONTROL`, for exercising
/// `control_kind_for`'s routing (start-of-day, sequence reset, or a
/// pass-through administrative check-in).
fn control_packet(sn: u64, category: u8, msg_type: u8, text: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend(pmap_bytes(4));
    body.extend(stop_bit_u32(templates::TEMPLATE_CONTROL as u32));
    body.extend(stop_bit_u32(category as u32));
    body.extend(stop_bit_u32(msg_type as u32));
    body.extend(stop_bit_str(text));
    wrap_packet(sn, body)
}

#[test]
fn ordered_stream_dedupes_a_mirrored_copy_on_the_other_side() {
    let mut a = QueueDatagramSource::new();
    a.push(quote_packet(100, 1250, 1260));
    let mut b = QueueDatagramSource::new();
    b.push(quote_packet(100, 1250, 1260));

    let mut loop_ = IngestLoop::new(one_line_config(), 1, Box::new(EmptyDirectory), RecordingSink::default(), vec![[Some(a), Some(b)]]);

    let outcome = loop_.tick();
    assert_eq!(outcome.packets_delivered, 1);
    assert_eq!(outcome.packets_dropped, 1);
    assert_eq!(loop_.stats().duplicates.load(std::sync::atomic::Ordering::Relaxed), 1);
    // Exactly one record reaches the publisher: the mirrored B copy never
    // gets far enough to call `process_option_message`.
    assert_eq!(loop_.publisher().sent.len(), 1);
    assert_eq!(loop_.publisher().topics.len(), 1);
}

/// Replays spec scenario 2 (FT-line gap then recovery) layered with
/// scenario 6 (option-level supersede): side A runs ahead to sequence 103
/// while side B's mirrored retransmission of the skipped message 102
/// arrives after the option entry has already moved past it, so the
/// arbiter recovers the gap but the processor still discards the stale
/// update.
#[test]
fn ftline_gap_recovery_interacts_with_option_level_supersede() {
    let mut a = QueueDatagramSource::new();
    let mut b = QueueDatagramSource::new();

    // Establish a clean starting point on both sides (spec scenario 4):
    // A's start-of-day arrives first, then B's own naturally-mirrored copy
    // of the same start-of-day message (what a real OPRA line actually
    // sends on both physical streams).
    a.push(control_packet(99, b'H', b'C', b"SOD"));
    b.push(control_packet(99, b'H', b'C', b"SOD"));

    a.push(quote_packet(100, 1250, 1260));
    a.push(quote_packet(101, 1251, 1261));
    a.push(quote_packet(103, 1253, 1263)); // A skips 102: gap of 1.

    b.push(quote_packet(100, 1250, 1260));
    b.push(quote_packet(101, 1251, 1261));
    b.push(quote_packet(102, 1252, 1262)); // B's recovery of the skipped message.
    b.push(quote_packet(103, 1253, 1263));

    let mut loop_ = IngestLoop::new(one_line_config(), 1, Box::new(EmptyDirectory), RecordingSink::default(), vec![[Some(a), Some(b)]]);

    // One tick per queued pair (2 control + 4 data each): 6 ticks drains both queues.
    for _ in 0..6 {
        loop_.tick();
    }

    let events = &loop_.publisher().ftline_events;
    assert!(events.iter().any(|(ftline, event)| *ftline == 0
        && matches!(event, opra_feed_core::arbiter::FtLineEvent::Reset(opra_feed_core::arbiter::ResetFlavor::StartOfDay))));

    let stats = loop_.stats();
    use std::sync::atomic::Ordering::Relaxed;
    // B's mirrored 100, 101, 103 land after the line cursor has already
    // passed them.
    assert_eq!(stats.duplicates.load(Relaxed), 3);
    // B's own mirrored start-of-day arrives while still marked pending.
    assert_eq!(stats.waiting_reset_dropped.load(Relaxed), 1);
    // B's recovery of 102 is accepted by the arbiter...
    assert_eq!(stats.option_level_superseded.load(Relaxed), 1);
    // ...but rejected by the processor, since the option entry is already
    // past sequence 102 (A's 103 got there first). `sent` holds A's
    // start-of-day control publish plus its three quote publishes (100,
    // 101, 103); B's mirrored start-of-day is consumed silently by the
    // reset-pending guard and never reaches the publisher.
    assert_eq!(loop_.publisher().sent.len(), 4);
}

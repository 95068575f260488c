//! The single-threaded, cooperative ingest loop (spec.md §4.5 "Loop").
//!
//! One iteration polls every enabled physical line with a short timeout,
//! arbitrates and decodes whatever arrived, and flushes the publisher
//! once per packet. No line ever blocks another: a quiet A side never
//! starves a busy B side, since every socket gets its own bounded wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::arbiter::{Arbiter, Decision, FtLineEvent, ResetFlavor, Side};
use crate::config::FeedConfig;
use crate::error::WireError;
use crate::fast::decoder::Decoder;
use crate::ingest::dispatch::{decode_message, DecodedMessage};
use crate::ingest::packet::{self, PacketHeader};
use crate::ingest::socket::DatagramSource;
use crate::listed::ListedOptionDirectory;
use crate::processor::{self, ProcessorContext};
use crate::publisher::{LineStatus, Observer, Publisher};
use crate::stats::FeedStats;
use crate::table::OptionTable;
use crate::topic::render_topic;

/// Per-socket receive timeout. The loop's overall tick rate is bounded
/// by `num_lines * 2 * PER_SOCKET_TIMEOUT` in the worst case where every
/// socket times out (spec.md §4.5 "100 ms select timeout").
const PER_SOCKET_TIMEOUT: Duration = Duration::from_millis(100);
/// Largest single datagram this loop will accept.
const MAX_DATAGRAM: usize = 1500;

/// Outcome of a single `IngestLoop::tick`, for callers that want to
/// observe progress without running the blocking `run` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    pub packets_delivered: u32,
    pub packets_dropped: u32,
}

/// Owns every component the ingest loop drives: per-line sockets and
/// decoders, the arbiter, the option table, and the publisher/observer
/// sink (spec.md §3 "Ownership").
pub struct IngestLoop<S: DatagramSource, P: Publisher + Observer> {
    config: FeedConfig,
    arbiter: Arbiter,
    table: OptionTable,
    stats: FeedStats,
    ctx: ProcessorContext,
    /// `[a, b]` datagram source per configured FT line; `None` if that
    /// side is disabled.
    sources: Vec<[Option<S>; 2]>,
    /// `[a, b]` FAST decoder state per FT line: each physical stream
    /// carries its own independent COPY/INCR/DELTA cache.
    decoders: Vec<[Decoder; 2]>,
    /// Static per-root reference data consulted when a new option entry is
    /// first created (spec.md §3 listed-option back-reference).
    listed_directory: Box<dyn ListedOptionDirectory>,
    publisher: P,
    /// `[a, b]` last packet-arrival instant per FT line, for the jitter
    /// histogram (spec.md §4.5).
    last_arrival: Vec<[Option<Instant>; 2]>,
    start: Instant,
    last_periodic_stats: Instant,
    last_line_status: Instant,
}

impl<S: DatagramSource, P: Publisher + Observer> IngestLoop<S, P> {
    pub fn new(
        config: FeedConfig,
        process_id: u32,
        listed_directory: Box<dyn ListedOptionDirectory>,
        publisher: P,
        sources: Vec<[Option<S>; 2]>,
    ) -> Self {
        let num_lines = config.num_lines();
        let arbiter = Arbiter::new(num_lines, config.seq_jump_threshold, config.jitter_stats);
        let table = OptionTable::new(config.table_size, num_lines);
        let decoders = (0..num_lines).map(|_| [Decoder::new(), Decoder::new()]).collect();
        let last_arrival = (0..num_lines).map(|_| [None, None]).collect();
        let ctx = ProcessorContext { process_id, partial_publish: config.partial_publish };
        let now = Instant::now();
        IngestLoop {
            config,
            arbiter,
            table,
            stats: FeedStats::new(),
            ctx,
            sources,
            decoders,
            listed_directory,
            publisher,
            last_arrival,
            start: now,
            last_periodic_stats: now,
            last_line_status: now,
        }
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// Exposes the publisher/observer sink, e.g. for a `RecordingSink` in
    /// tests that want to inspect what was sent.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    fn now_usec(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Runs until `shutdown` is set, calling `tick` in a loop (spec.md
    /// §4.5 "runs until told to stop").
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::Relaxed) {
            self.tick();
        }
    }

    /// One pass over every enabled socket. Never blocks longer than
    /// `num_lines * 2 * PER_SOCKET_TIMEOUT` in aggregate.
    pub fn tick(&mut self) -> LoopOutcome {
        FeedStats::incr(&self.stats.loop_iterations);
        let mut outcome = LoopOutcome { packets_delivered: 0, packets_dropped: 0 };
        let mut buf = [0u8; MAX_DATAGRAM];

        for ftline in 0..self.sources.len() as u16 {
            for side_idx in 0..2 {
                let side = if side_idx == 0 { Side::A } else { Side::B };
                let had_data = match self.sources[ftline as usize][side_idx].as_mut() {
                    Some(source) => match source.recv(&mut buf, PER_SOCKET_TIMEOUT) {
                        Ok(Some(n)) => {
                            self.handle_datagram(ftline, side, &buf[..n], &mut outcome);
                            true
                        }
                        Ok(None) => false,
                        Err(e) => {
                            warn!(?ftline, ?e, "datagram source read error");
                            false
                        }
                    },
                    None => false,
                };
                if !had_data {
                    FeedStats::incr(&self.stats.loop_timeouts);
                }
            }
        }

        self.publisher.flush();
        self.maybe_emit_periodic_stats();
        self.maybe_emit_line_status();
        outcome
    }

    fn handle_datagram(&mut self, ftline: u16, side: Side, data: &[u8], outcome: &mut LoopOutcome) {
        FeedStats::incr(&self.stats.packets_received);
        let side_idx = side.index();
        let now = Instant::now();
        let prev_arrival = self.last_arrival[ftline as usize][side_idx].replace(now);
        {
            let side_stats = &mut self.arbiter.line_mut(ftline).side_stats[side_idx];
            side_stats.packets += 1;
            side_stats.bytes += data.len() as u64;
            if let (Some(prev), Some(hist)) = (prev_arrival, side_stats.jitter.as_mut()) {
                hist.record(now.duration_since(prev).as_micros() as u64);
                hist.due_for_dump();
            }
        }

        let header = match packet::parse_header(data) {
            Ok(h) => h,
            Err(e) => {
                debug!(?ftline, ?side, ?e, "malformed packet header");
                FeedStats::incr(&self.stats.decode_errors);
                self.arbiter.line_mut(ftline).side_stats[side_idx].errors += 1;
                outcome.packets_dropped += 1;
                return;
            }
        };
        {
            let side_stats = &mut self.arbiter.line_mut(ftline).side_stats[side_idx];
            side_stats.last_seen_sn = header.sequence_number;
            side_stats.messages += header.message_count.max(1) as u64;
        }

        let missing_before = self.arbiter.line(ftline).missing();
        let decision = self.arbiter.arrive(ftline, side, header.sequence_number, header.message_count, &mut self.publisher);
        let missing_after = self.arbiter.line(ftline).missing();
        {
            let side_stats = &mut self.arbiter.line_mut(ftline).side_stats[side_idx];
            if missing_after > missing_before {
                side_stats.losses += missing_after - missing_before;
            } else if missing_after < missing_before {
                side_stats.recoveries += missing_before - missing_after;
            }
        }

        match decision {
            Decision::Deliver => outcome.packets_delivered += 1,
            Decision::DropDup => {
                FeedStats::incr(&self.stats.duplicates);
                self.arbiter.line_mut(ftline).side_stats[side_idx].duplicates += 1;
                outcome.packets_dropped += 1;
            }
            Decision::DropLate => {
                FeedStats::incr(&self.stats.late_dropped);
                self.arbiter.line_mut(ftline).side_stats[side_idx].late += 1;
                outcome.packets_dropped += 1;
            }
            Decision::DropWaitingReset => {
                FeedStats::incr(&self.stats.waiting_reset_dropped);
                outcome.packets_dropped += 1;
            }
        }

        // Every packet is decoded regardless of `decision`: this side's FAST
        // COPY/DELTA cache must track every byte that physically arrived on
        // it, and an administrative reset is authoritative over the window
        // that produced `decision` in the first place (it is what clears
        // `reset_pending`, so it cannot itself be gated by that flag).
        self.deliver_messages(ftline, side, &header, data, decision == Decision::Deliver);
    }

    /// Resets daily high/low on every option entry assigned to `ftline`,
    /// following a start-of-day control message (spec.md §3).
    fn reset_daily_range_for_line(&mut self, ftline: u16) {
        let handles: Vec<_> = self.table.members_of(ftline).to_vec();
        for handle in handles {
            self.table.get_mut(handle).reset_daily_range();
        }
    }

    fn deliver_messages(&mut self, ftline: u16, side: Side, header: &PacketHeader, data: &[u8], deliver: bool) {
        let mut pos = header.body_offset;
        let count = header.message_count.max(1);

        for i in 0..count {
            // Scoped so the decoder borrow ends before `process_decoded`
            // needs the rest of `self`.
            let decoded = {
                let decoder = &mut self.decoders[ftline as usize][side.index()];
                if decoder.begin_message(data, &mut pos).is_err() {
                    FeedStats::incr(&self.stats.decode_errors);
                    break;
                }
                let decoded = decode_message(decoder, data, &mut pos);
                let _ = decoder.end_message();
                decoded
            };
            let msg = match decoded {
                Ok(m) => m,
                Err(e) => {
                    error!(?ftline, ?side, message_index = i, ?e, "FAST decode failed");
                    FeedStats::incr(&self.stats.decode_errors);
                    continue;
                }
            };
            self.process_decoded(ftline, side, header.sequence_number + i as u64, msg, deliver);
        }
    }

    fn process_decoded(&mut self, ftline: u16, side: Side, sequence: u64, msg: DecodedMessage, deliver: bool) {
        let generation_time_usec = self.now_usec();
        match msg {
            DecodedMessage::Option { key, category, participant, input } => {
                if !deliver {
                    return;
                }
                let topic = render_topic(&self.config.topic_fmt, &key);
                // The invented template set carries no separate
                // participant-timestamp field, so the same local
                // generation time stands in for both header timestamps.
                let result: Result<(), WireError> = processor::process_option_message(
                    &self.ctx,
                    &mut self.table,
                    self.listed_directory.as_ref(),
                    &self.stats,
                    key,
                    ftline,
                    &topic,
                    category,
                    participant,
                    sequence,
                    generation_time_usec,
                    generation_time_usec,
                    input,
                    &mut self.publisher,
                );
                if let Err(e) = result {
                    warn!(?ftline, ?e, "option message processing failed");
                    FeedStats::incr(&self.stats.decode_errors);
                }
            }
            DecodedMessage::Underlying { .. } => {
                // Underlying index state lives outside the option table;
                // embedding code that needs it wires its own `UnderlyingState`
                // table and calls `processor::categories::underlying::apply`.
            }
            DecodedMessage::Control { category, msg_type, body } => {
                // Resets are authoritative regardless of `deliver`: this is
                // what clears `reset_pending` for this side.
                let events = self.arbiter.handle_control(ftline, side, category, msg_type, sequence, &mut self.publisher);
                if is_start_of_day(&events) {
                    self.reset_daily_range_for_line(ftline);
                }
                if deliver {
                    processor::process_control(&body, &mut self.publisher);
                }
            }
            DecodedMessage::Admin { category, msg_type, body } => {
                let events = self.arbiter.handle_control(ftline, side, category, msg_type, sequence, &mut self.publisher);
                if is_start_of_day(&events) {
                    self.reset_daily_range_for_line(ftline);
                }
                if deliver {
                    processor::process_admin(&body, &mut self.publisher);
                }
            }
        }
    }

    fn maybe_emit_periodic_stats(&mut self) {
        if !self.config.periodic_stats {
            return;
        }
        if self.last_periodic_stats.elapsed() < Duration::from_secs(self.config.periodic_stats_interval_secs) {
            return;
        }
        self.last_periodic_stats = Instant::now();
        let snapshot = self.stats.snapshot();
        self.stats.table_entries.store(self.table.stats().count as u64, Ordering::Relaxed);
        self.publisher.on_periodic_stats(&self.stats);
        debug!(?snapshot, "periodic stats");
    }

    fn maybe_emit_line_status(&mut self) {
        if !self.config.line_status_enable {
            return;
        }
        if self.last_line_status.elapsed() < Duration::from_secs(self.config.line_status_period_secs) {
            return;
        }
        self.last_line_status = Instant::now();
        for ftline in 0..self.arbiter.num_lines() {
            let line = self.arbiter.line(ftline);
            let status = LineStatus { tag: line.tag(), missing: line.missing(), expected_sn: line.expected_sn() };
            self.publisher.on_line_status(ftline, status);
        }
    }
}

fn is_start_of_day(events: &[FtLineEvent]) -> bool {
    events.iter().any(|e| matches!(e, FtLineEvent::Reset(ResetFlavor::StartOfDay)))
}

/// Pins the calling thread to `cpu` and locks its memory pages, per
/// spec.md §4.5 "Scheduling" and §6 `processes[i].cpu`. A no-op outside
/// the `net` feature.
#[cfg(feature = "net")]
pub fn apply_process_affinity(cpu: Option<usize>) {
    if let Some(cpu) = cpu {
        if let Some(core_ids) = core_affinity::get_core_ids() {
            if let Some(id) = core_ids.into_iter().find(|c| c.id == cpu) {
                core_affinity::set_for_current(id);
            } else {
                warn!(cpu, "requested cpu id not found among available cores");
            }
        }
    }
    #[cfg(target_os = "linux")]
    unsafe {
        if libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) != 0 {
            warn!("mlockall failed; continuing without locked pages");
        }
    }
}

#[cfg(not(feature = "net"))]
pub fn apply_process_affinity(_cpu: Option<usize>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LineEndpoint, LineEndpoints, PartialPublish, TopicFormat};
    use crate::ingest::socket::QueueDatagramSource;
    use crate::listed::EmptyDirectory;
    use crate::publisher::RecordingSink;

    fn endpoint(enable: bool) -> LineEndpoint {
        LineEndpoint { enable, address: "224.0.1.1".into(), port: 0, interface: "0.0.0.0".into() }
    }

    fn test_config() -> FeedConfig {
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
            lines: vec![LineEndpoints { a: endpoint(true), b: endpoint(true) }],
            processes: vec![],
        }
    }

    fn pmap_bytes(n: usize) -> Vec<u8> {
        let bytes_needed = n.div_ceil(7).max(1);
        let mut out = vec![0x7fu8; bytes_needed];
        *out.last_mut().unwrap() |= 0x80;
        out
    }

    /// Encodes `v` as big-endian 7-bit stop-bit groups, the inverse of
    /// `Decoder::read_wire_u32`.
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

    fn build_quote_packet(sn: u64) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(pmap_bytes(19)); // template id, category, msg type, 8 key fields, 8 quote fields
        body.extend(stop_bit_u32(crate::ingest::templates::TEMPLATE_QUOTE as u32));
        body.extend(stop_bit_u32(b'k' as u32));
        body.extend(stop_bit_u32(b'Q' as u32));
        body.extend(stop_bit_str(b"MSFT"));
        body.extend(stop_bit_u32(b'N' as u32));
        body.extend(stop_bit_u32(25));
        body.extend(stop_bit_u32(b'A' as u32));
        body.extend(stop_bit_u32(17));
        body.extend(stop_bit_u32(b'Q' as u32));
        body.extend(stop_bit_u32(300));
        body.extend(stop_bit_u32(b'@' as u32));
        body.extend(stop_bit_u32(b'F' as u32));
        body.extend(stop_bit_u32(b'D' as u32));
        body.extend(stop_bit_u32(1250));
        body.extend(stop_bit_u32(1260));
        body.extend(stop_bit_u32(b'1' as u32));
        body.extend(stop_bit_u32(b'N' as u32));
        body.extend(stop_bit_u32(0));
        body.extend(stop_bit_u32(0));

        let mut pkt = vec![packet::SOH, packet::SUPPORTED_VERSION];
        pkt.extend(format!("{sn:010}").into_bytes());
        pkt.extend(format!("{:03}", 1).into_bytes());
        pkt.push(packet::RUNS_TO_END);
        pkt.extend(body);
        pkt
    }

    #[test]
    fn tick_delivers_a_decoded_quote_and_publishes_it() {
        let mut a_source = QueueDatagramSource::new();
        a_source.push(build_quote_packet(100));
        let sources: Vec<[Option<QueueDatagramSource>; 2]> = vec![[Some(a_source), None]];

        let mut loop_ = IngestLoop::new(test_config(), 1, Box::new(EmptyDirectory), RecordingSink::default(), sources);
        let outcome = loop_.tick();
        assert_eq!(outcome.packets_delivered, 1);
        assert_eq!(loop_.publisher.sent.len(), 1);
        assert_eq!(loop_.publisher.topics.len(), 1);
    }
}

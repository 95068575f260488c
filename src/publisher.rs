//! Narrowed collaborator surface for the downstream publisher and
//! observer hooks (spec.md §9 "Plugin hooks": ~100 named points in the
//! original narrowed to this trait pair).

use crate::arbiter::FtLineEvent;
use crate::stats::FeedStats;

/// Opaque token returned by `Publisher::register_topic`, stored on the
/// option entry (spec.md §3: "an opaque back-pointer reserved for the
/// external publisher"). The core never interprets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicHandle(pub u64);

/// The downstream messaging bus, as the core requires of it (spec.md §1
/// "Out of scope: downstream messaging transport").
pub trait Publisher {
    /// Sends one serialized wire record (spec.md §6 "Wire output").
    fn send(&mut self, bytes: &[u8]);
    /// Releases any batched transmission unit; called once per packet at
    /// the end of the ingest loop's iteration (spec.md §4.4 "Output").
    fn flush(&mut self);
    /// Registers a rendered topic string, returning an opaque handle to
    /// cache on the option entry.
    fn register_topic(&mut self, topic: &str) -> TopicHandle;
}

/// Pure-notification side-effect sink (spec.md §4.3 "Side effects": "the
/// arbiter does not wait on it"). Every method has a no-op default so
/// implementers only override what they use.
pub trait Observer {
    fn on_ftline_event(&mut self, ftline: u16, event: FtLineEvent);
    fn on_periodic_stats(&mut self, _snapshot: &FeedStats) {}
    fn on_line_status(&mut self, _ftline: u16, _status: LineStatus) {}
}

/// Periodic FT-line heartbeat payload (spec.md §6 `line_status_enable`/
/// `line_status_period`), grounded on the original's `fh_opra_lh_tap.c`
/// line-health tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStatus {
    pub tag: crate::arbiter::FtLineTag,
    pub missing: u64,
    pub expected_sn: u64,
}

/// A `Publisher` that discards everything — useful for tests and for
/// embedding code that only wants the core's side effects via `Observer`.
#[derive(Debug, Default)]
pub struct NoopPublisher {
    next_handle: u64,
}

impl Publisher for NoopPublisher {
    fn send(&mut self, _bytes: &[u8]) {}
    fn flush(&mut self) {}
    fn register_topic(&mut self, _topic: &str) -> TopicHandle {
        self.next_handle += 1;
        TopicHandle(self.next_handle)
    }
}

/// An `Observer` that discards everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_ftline_event(&mut self, _ftline: u16, _event: FtLineEvent) {}
}

/// A `Publisher`/`Observer` that records everything it receives, for
/// assertions in tests (grounded on the teacher's in-memory
/// `TradeListener` test doubles).
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<Vec<u8>>,
    pub flushes: u32,
    pub topics: Vec<String>,
    pub ftline_events: Vec<(u16, FtLineEvent)>,
}

impl Publisher for RecordingSink {
    fn send(&mut self, bytes: &[u8]) {
        self.sent.push(bytes.to_vec());
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn register_topic(&mut self, topic: &str) -> TopicHandle {
        self.topics.push(topic.to_string());
        TopicHandle(self.topics.len() as u64)
    }
}

impl Observer for RecordingSink {
    fn on_ftline_event(&mut self, ftline: u16, event: FtLineEvent) {
        self.ftline_events.push((ftline, event));
    }
}

#[cfg(feature = "nats")]
pub mod nats {
    //! NATS JetStream publisher, mirroring the teacher's
    //! `orderbook::nats::NatsTradePublisher`: synchronous serialization and
    //! sequence numbering, with the actual publish spawned onto a Tokio
    //! runtime and retried with exponential backoff on transient failure.

    use super::{Publisher, TopicHandle};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tracing::{error, trace, warn};

    const DEFAULT_MAX_RETRIES: u32 = 3;
    const BASE_RETRY_DELAY_MS: u64 = 10;

    /// Publishes normalized records to `{prefix}.{topic}` subjects.
    pub struct NatsPublisher {
        jetstream: async_nats::jetstream::Context,
        subject_prefix: String,
        runtime: tokio::runtime::Handle,
        sequence: AtomicU64,
        publish_count: AtomicU64,
        error_count: AtomicU64,
        max_retries: u32,
        topics: HashMap<String, TopicHandle>,
        next_handle: u64,
        pending_subject: Option<String>,
    }

    impl NatsPublisher {
        pub fn new(
            jetstream: async_nats::jetstream::Context,
            subject_prefix: String,
            runtime: tokio::runtime::Handle,
        ) -> Self {
            NatsPublisher {
                jetstream,
                subject_prefix,
                runtime,
                sequence: AtomicU64::new(0),
                publish_count: AtomicU64::new(0),
                error_count: AtomicU64::new(0),
                max_retries: DEFAULT_MAX_RETRIES,
                topics: HashMap::new(),
                next_handle: 0,
                pending_subject: None,
            }
        }

        pub fn publish_count(&self) -> u64 {
            self.publish_count.load(Ordering::Relaxed)
        }

        pub fn error_count(&self) -> u64 {
            self.error_count.load(Ordering::Relaxed)
        }

        fn publish_one(&self, subject: String, payload: Vec<u8>) {
            let jetstream = self.jetstream.clone();
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let max_retries = self.max_retries;
            self.runtime.spawn(async move {
                let mut attempt = 0;
                loop {
                    match jetstream.publish(subject.clone(), payload.clone().into()).await {
                        Ok(ack) => {
                            if let Err(e) = ack.await {
                                warn!(error = %e, seq, "nats ack wait failed");
                            } else {
                                trace!(seq, subject = %subject, "published");
                            }
                            return;
                        }
                        Err(e) => {
                            attempt += 1;
                            if attempt >= max_retries {
                                error!(error = %e, seq, subject = %subject, "nats publish failed permanently");
                                return;
                            }
                            let delay = BASE_RETRY_DELAY_MS * (1 << attempt.min(4));
                            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                        }
                    }
                }
            });
        }
    }

    impl Publisher for NatsPublisher {
        fn send(&mut self, bytes: &[u8]) {
            let subject = self
                .pending_subject
                .take()
                .unwrap_or_else(|| format!("{}.all", self.subject_prefix));
            self.publish_count.fetch_add(1, Ordering::Relaxed);
            self.publish_one(subject, bytes.to_vec());
        }

        fn flush(&mut self) {}

        fn register_topic(&mut self, topic: &str) -> TopicHandle {
            if let Some(h) = self.topics.get(topic) {
                return *h;
            }
            self.next_handle += 1;
            let handle = TopicHandle(self.next_handle);
            self.topics.insert(topic.to_string(), handle);
            handle
        }
    }
}

#[cfg(feature = "nats")]
pub use nats::NatsPublisher;

//! # OPRA Feed Core
//!
//! Ingest, FT-line arbitration, FAST decode, and option-state core for
//! the OPRA multicast feed. This crate owns the part of a feed handler
//! between "bytes off the wire" and "a topic-addressable option record
//! ready to publish" — it does not open sockets itself beyond the
//! optional [`ingest::socket::UdpDatagramSource`], and it does not
//! decide what a downstream consumer does with a published record.
//!
//! ## Architecture
//!
//! Five components, built leaves-first and wired together by
//! [`ingest::IngestLoop`]:
//!
//! - [`table`] — the option state cache: a slab arena of
//!   [`table::OptionEntry`] values keyed by [`table::OptionKey`] through
//!   an external-chaining hash index ([`table::OptionTable`]).
//! - [`fast`] — the FAST (FIX Adapted for STreaming) field codec:
//!   presence maps, COPY/INCR/DELTA/NONE operator state
//!   ([`fast::Decoder`]), and the [`fast::Tag`] addressing scheme tying
//!   a wire field to its per-template cache slot.
//! - [`arbiter`] — FT-line (Fault-Tolerant line) A/B-side redundancy:
//!   per-line duplicate and gap detection, recovery and reset handling
//!   ([`arbiter::Arbiter`]).
//! - [`processor`] — turns a decoded message plus the option it refers
//!   to into a state transition: per-category handlers
//!   ([`processor::categories`]), price and expiry normalization, change
//!   tracking ([`table::UpdateFlags`]), and outbound record shaping.
//! - [`ingest`] — the cooperative single-threaded loop that ties the
//!   above four together: packet framing ([`ingest::packet`]), the
//!   [`ingest::socket::DatagramSource`] collaborator contract, the FAST
//!   template table, and message dispatch.
//!
//! Supporting modules: [`config`] (startup configuration and its
//! fallible parsing), [`error`] (fatal [`error::ConfigError`] versus
//! per-packet [`error::WireError`]), [`stats`] (atomic counters for
//! periodic health reporting), [`topic`] (per-option topic string
//! rendering), [`publisher`] (the [`publisher::Publisher`] and
//! [`publisher::Observer`] outbound contracts, with an optional NATS
//! JetStream implementation), and [`listed`] (the
//! [`listed::ListedOptionDirectory`] contract consulted at
//! [`table::OptionTable::insert`] to resolve an entry's static
//! reference-data back-reference).
//!
//! ## Status
//!
//! This crate covers the feed-handler core only. It does not include a
//! binary entry point, a metrics-export surface, or a concrete
//! multicast deployment topology — those are expected to live in the
//! embedding application, which drives [`ingest::IngestLoop`] from its
//! own `main`.

pub mod arbiter;
pub mod config;
pub mod error;
pub mod fast;
pub mod ingest;
pub mod listed;
pub mod processor;
pub mod publisher;
pub mod stats;
pub mod table;
pub mod topic;

pub use arbiter::{Arbiter, Decision, Side};
pub use config::FeedConfig;
pub use error::{ConfigError, WireError};
pub use fast::{DecodeError, Decoder, Operator, Tag, ValueType};
pub use ingest::{DatagramSource, IngestLoop, LoopOutcome};
pub use listed::ListedOptionDirectory;
pub use processor::{CategoryInput, ProcessorContext};
pub use publisher::{Observer, Publisher, TopicHandle};
pub use stats::{FeedStats, FeedStatsSnapshot};
pub use table::{OptionEntry, OptionHandle, OptionKey, OptionTable, UpdateFlags, PRICE_SCALE};
pub use topic::render_topic;

//! C5: the ingest loop (spec.md §4.5) and its collaborators — packet
//! framing, the datagram-source contract, the invented FAST template
//! table, and message dispatch.

pub mod dispatch;
pub mod loop_;
pub mod packet;
pub mod socket;
pub mod templates;

pub use loop_::{IngestLoop, LoopOutcome};
pub use socket::DatagramSource;

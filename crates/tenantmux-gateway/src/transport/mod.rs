//! Shared-listener transport.
//!
//! One TCP port carries both the plaintext HTTP ops endpoints and the gRPC
//! service; connections are classified by their first bytes and routed.

pub mod demux;
pub mod http;
pub mod sniff;
pub mod tls;

pub use demux::{DemuxOutputs, Demultiplexer};
pub use sniff::{classify, sniff, Protocol, SniffedStream};
pub use tls::TlsSettings;

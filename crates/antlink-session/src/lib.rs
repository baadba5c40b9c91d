//! Threaded session management for ANT radio devices.
//!
//! A [`Session`] owns one transport. While started it runs two threads:
//! an I/O pump that writes outbound messages and polls the transport for
//! bytes, and a decoder that reassembles those bytes into messages for the
//! consumer. The [`command`] module builds and enqueues protocol commands.

pub mod command;
pub mod config;
pub mod error;
pub mod event;
mod inbound;
mod pump;
pub mod session;

#[cfg(test)]
mod testing;

pub use command::{burst_packets, burst_sequence};
pub use config::{SessionConfig, DEFAULT_INBOUND_CAPACITY};
pub use error::{Result, SessionError};
pub use event::{DecoderStats, EventSink, Lane, NullSink, SessionEvent, TracingSink};
pub use session::{Outbound, Session};

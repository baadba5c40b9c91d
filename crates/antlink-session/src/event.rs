//! Observability hooks for a running session.
//!
//! The pump and decoder threads never log directly; they report
//! [`SessionEvent`]s to the [`EventSink`] the session was built with.

use std::fmt;

use antlink_frame::message_name;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

/// Outbound traffic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    /// Configuration and control commands.
    Queued,
    /// Acknowledged and burst data, written ahead of queued traffic.
    Timeslot,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Queued => f.write_str("queued"),
            Lane::Timeslot => f.write_str("timeslot"),
        }
    }
}

/// Counters reported by the decoder thread when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// Valid frames handed to the consumer.
    pub decoded: u64,
    /// Frames discarded because they failed validation.
    pub rejected: u64,
    /// Valid frames dropped because the consumer was not keeping up.
    pub dropped: u64,
    /// Bytes of an incomplete frame discarded at shutdown.
    pub discarded_bytes: usize,
}

/// Something that happened inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { buffer_size: usize },
    Stopped { stats: DecoderStats },
    MessageWritten { lane: Lane, id: u8, len: usize },
    EncodeFailed { lane: Lane, id: u8, reason: String },
    FrameDecoded { id: u8, len: usize },
    FrameRejected { reason: String },
    FrameDropped { id: u8 },
    PumpFailed { reason: String },
}

/// Receives session events. Called from the pump and decoder threads.
pub trait EventSink: Send + Sync {
    fn event(&self, event: &SessionEvent);
}

impl<F> EventSink for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn event(&self, event: &SessionEvent) {
        self(event)
    }
}

/// Forwards events to `tracing`. This is the default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { buffer_size } => {
                info!(buffer_size, "session started");
            }
            SessionEvent::Stopped { stats } => {
                info!(
                    decoded = stats.decoded,
                    rejected = stats.rejected,
                    dropped = stats.dropped,
                    discarded_bytes = stats.discarded_bytes,
                    "session stopped"
                );
            }
            SessionEvent::MessageWritten { lane, id, len } => {
                debug!(%lane, id = format_args!("0x{id:02X}"), name = message_name(*id), len, "wrote message");
            }
            SessionEvent::EncodeFailed { lane, id, reason } => {
                warn!(%lane, id = format_args!("0x{id:02X}"), reason = %reason, "dropping unencodable message");
            }
            SessionEvent::FrameDecoded { id, len } => {
                trace!(id = format_args!("0x{id:02X}"), name = message_name(*id), len, "decoded frame");
            }
            SessionEvent::FrameRejected { reason } => {
                debug!(reason = %reason, "discarding corrupt frame");
            }
            SessionEvent::FrameDropped { id } => {
                debug!(id = format_args!("0x{id:02X}"), "inbound queue full, frame dropped");
            }
            SessionEvent::PumpFailed { reason } => {
                warn!(reason = %reason, "I/O pump stopped on write failure");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn event(&self, _event: &SessionEvent) {}
}

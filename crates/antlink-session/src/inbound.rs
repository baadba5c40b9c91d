//! The decoder thread: turns pumped byte chunks into published messages.

use antlink_frame::{FrameDecoder, Message};
use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::event::{DecoderStats, EventSink, SessionEvent};

/// Decode until the pump drops its end of `bytes`.
///
/// Publishing never blocks: a message the consumer has no room for is
/// dropped. A partial frame held when the byte channel closes is discarded.
pub(crate) fn run(
    bytes: Receiver<Bytes>,
    inbound: Sender<Message>,
    sink: &dyn EventSink,
) -> DecoderStats {
    let mut decoder = FrameDecoder::new();
    let mut stats = DecoderStats::default();

    for chunk in bytes.iter() {
        for result in decoder.feed(&chunk) {
            match result {
                Ok(message) => publish(&inbound, message, &mut stats, sink),
                Err(err) => {
                    stats.rejected += 1;
                    sink.event(&SessionEvent::FrameRejected {
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    stats.discarded_bytes = decoder.pending_len();
    stats
}

fn publish(
    inbound: &Sender<Message>,
    message: Message,
    stats: &mut DecoderStats,
    sink: &dyn EventSink,
) {
    let id = message.id;
    let len = message.payload.len();
    match inbound.try_send(message) {
        Ok(()) => {
            stats.decoded += 1;
            sink.event(&SessionEvent::FrameDecoded { id, len });
        }
        Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
            stats.dropped += 1;
            sink.event(&SessionEvent::FrameDropped { id });
        }
    }
}

#[cfg(test)]
mod tests {
    use antlink_frame::ids;
    use crossbeam_channel::{bounded, unbounded};

    use super::*;
    use crate::testing::RecordingSink;

    fn frame(id: u8, payload: &[u8]) -> Bytes {
        Message::new(id, payload.to_vec()).encode().unwrap()
    }

    #[test]
    fn decodes_across_chunk_boundaries() {
        let wire = frame(ids::BROADCAST_DATA, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let (bytes_tx, bytes_rx) = unbounded();
        let (inbound_tx, inbound_rx) = unbounded();
        bytes_tx.send(wire.slice(..3)).unwrap();
        bytes_tx.send(wire.slice(3..7)).unwrap();
        bytes_tx.send(wire.slice(7..)).unwrap();
        drop(bytes_tx);

        let stats = run(bytes_rx, inbound_tx, &RecordingSink::default());

        assert_eq!(stats.decoded, 1);
        let msg = inbound_rx.try_recv().unwrap();
        assert_eq!(msg.id, ids::BROADCAST_DATA);
        assert_eq!(msg.payload.len(), 9);
    }

    #[test]
    fn corrupt_frame_then_valid_frame() {
        let mut bad = frame(ids::OPEN_CHANNEL, &[1]).to_vec();
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        let (bytes_tx, bytes_rx) = unbounded();
        let (inbound_tx, inbound_rx) = unbounded();
        bytes_tx.send(Bytes::from(bad)).unwrap();
        bytes_tx.send(frame(ids::CLOSE_CHANNEL, &[1])).unwrap();
        drop(bytes_tx);

        let sink = RecordingSink::default();
        let stats = run(bytes_rx, inbound_tx, &sink);

        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.rejected, 1);
        let got: Vec<_> = inbound_rx.try_iter().map(|m| m.id).collect();
        assert_eq!(got, vec![ids::CLOSE_CHANNEL]);
        assert!(matches!(sink.events()[0], SessionEvent::FrameRejected { .. }));
    }

    #[test]
    fn full_inbound_queue_drops_newest() {
        let (bytes_tx, bytes_rx) = unbounded();
        let (inbound_tx, inbound_rx) = bounded(1);
        let mut wire = Vec::new();
        for channel in 0..3u8 {
            wire.extend_from_slice(&frame(ids::CHANNEL_STATUS, &[channel, 0x03]));
        }
        bytes_tx.send(Bytes::from(wire)).unwrap();
        drop(bytes_tx);

        let stats = run(bytes_rx, inbound_tx, &RecordingSink::default());

        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.dropped, 2);
        assert_eq!(inbound_rx.try_recv().unwrap().payload[0], 0);
        assert!(inbound_rx.try_recv().is_err());
    }

    #[test]
    fn closing_mid_frame_discards_partial() {
        let wire = frame(ids::NETWORK_KEY, &[0; 9]);
        let (bytes_tx, bytes_rx) = unbounded();
        let (inbound_tx, inbound_rx) = unbounded();
        bytes_tx.send(wire.slice(..6)).unwrap();
        drop(bytes_tx);

        let stats = run(bytes_rx, inbound_tx, &RecordingSink::default());

        assert_eq!(stats.decoded, 0);
        assert_eq!(stats.discarded_bytes, 6);
        assert!(inbound_rx.try_recv().is_err());
    }
}

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// First byte of every frame.
pub const SYNC: u8 = 0xA4;

/// Sync + length + id + checksum.
pub const FRAME_OVERHEAD: usize = 4;

/// The length field is a single byte.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// A decoded or to-be-encoded ANT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message id.
    pub id: u8,
    /// Message content, excluding id and checksum.
    pub payload: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    /// The total wire size of this message once framed.
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// First payload byte, which is the channel number for channel-scoped messages.
    pub fn channel(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Encode into a freshly allocated frame.
    pub fn encode(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_message(self, &mut dst)?;
        Ok(dst.freeze())
    }
}

/// XOR of every byte in `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬────────┬────────┬─────────────────┬──────────┐
/// │ 0xA4 │ Length │ Msg ID │ Payload         │ Checksum │
/// │ (1B) │ (1B)   │ (1B)   │ (Length bytes)  │ (1B XOR) │
/// └──────┴────────┴────────┴─────────────────┴──────────┘
/// ```
pub fn encode_message(message: &Message, dst: &mut BytesMut) -> Result<()> {
    let len = message.payload.len();
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD,
        });
    }

    let start = dst.len();
    dst.reserve(FRAME_OVERHEAD + len);
    dst.put_u8(SYNC);
    dst.put_u8(len as u8);
    dst.put_u8(message.id);
    dst.put_slice(&message.payload);
    let sum = checksum(&dst[start..]);
    dst.put_u8(sum);
    Ok(())
}

/// Validate one complete frame and decode it.
///
/// `frame` must hold exactly one frame: sync through checksum.
pub fn decode_message(frame: &[u8]) -> Result<Message> {
    if frame.len() < FRAME_OVERHEAD {
        return Err(FrameError::TooShort { len: frame.len() });
    }
    if frame[0] != SYNC {
        return Err(FrameError::InvalidSync { found: frame[0] });
    }

    let declared = frame[1] as usize;
    let actual = frame.len() - FRAME_OVERHEAD;
    if declared != actual {
        return Err(FrameError::LengthMismatch { declared, actual });
    }

    let (body, tail) = frame.split_at(frame.len() - 1);
    let computed = checksum(body);
    if computed != tail[0] {
        return Err(FrameError::ChecksumMismatch {
            computed,
            found: tail[0],
        });
    }

    Ok(Message {
        id: frame[2],
        payload: Bytes::copy_from_slice(&body[3..]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids;

    #[test]
    fn encode_reset_matches_reference_bytes() {
        let frame = Message::new(ids::SYSTEM_RESET, vec![0x00]).encode().unwrap();
        assert_eq!(frame.as_ref(), &[0xA4, 0x01, 0x4A, 0x00, 0xEF]);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let msg = Message::new(
            ids::BROADCAST_DATA,
            vec![0x00, 1, 2, 3, 4, 5, 6, 7, 8],
        );
        let frame = msg.encode().unwrap();
        assert_eq!(frame.len(), msg.wire_size());

        let decoded = decode_message(&frame).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.channel(), Some(0));
    }

    #[test]
    fn empty_payload() {
        let msg = Message::new(ids::STARTUP, Bytes::new());
        let frame = msg.encode().unwrap();
        assert_eq!(frame.len(), FRAME_OVERHEAD);

        let decoded = decode_message(&frame).unwrap();
        assert!(decoded.payload.is_empty());
        assert_eq!(decoded.channel(), None);
    }

    #[test]
    fn encode_appends_to_existing_buffer() {
        let mut buf = BytesMut::new();
        encode_message(&Message::new(ids::OPEN_CHANNEL, vec![1]), &mut buf).unwrap();
        encode_message(&Message::new(ids::CLOSE_CHANNEL, vec![1]), &mut buf).unwrap();

        let first = decode_message(&buf[..5]).unwrap();
        let second = decode_message(&buf[5..]).unwrap();
        assert_eq!(first.id, ids::OPEN_CHANNEL);
        assert_eq!(second.id, ids::CLOSE_CHANNEL);
    }

    #[test]
    fn payload_too_large() {
        let msg = Message::new(0x01, vec![0u8; MAX_PAYLOAD + 1]);
        let err = msg.encode().unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 256, max: 255 }
        ));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let mut frame = Message::new(ids::OPEN_CHANNEL, vec![0]).encode().unwrap().to_vec();
        *frame.last_mut().unwrap() ^= 0xFF;

        let err = decode_message(&frame).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
        assert!(err.is_integrity());
    }

    #[test]
    fn decode_rejects_bad_sync() {
        let err = decode_message(&[0x00, 0x00, 0x6F, 0x00]).unwrap_err();
        assert!(matches!(err, FrameError::InvalidSync { found: 0x00 }));
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let err = decode_message(&[SYNC, 0x03, 0x4B, 0x00, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::LengthMismatch {
                declared: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn decode_rejects_short_input() {
        let err = decode_message(&[SYNC, 0x00]).unwrap_err();
        assert!(matches!(err, FrameError::TooShort { len: 2 }));
    }
}

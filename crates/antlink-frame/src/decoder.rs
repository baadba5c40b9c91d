use bytes::{BufMut, BytesMut};

use crate::codec::{decode_message, Message, FRAME_OVERHEAD, SYNC};
use crate::error::Result;

#[derive(Debug)]
enum State {
    SeekingSync,
    ReadingLength,
    Assembling { frame: BytesMut, remaining: usize },
}

/// Incremental frame assembler for a continuous byte stream.
///
/// Feed bytes one at a time with [`push`](Self::push). Bytes before a sync
/// byte are skipped; once a length byte is seen, exactly `length + 2` more
/// bytes complete the frame, which is then validated. A frame that fails
/// validation is reported once and scanning resumes at the next sync byte.
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
}

impl FrameDecoder {
    /// Create a decoder waiting for a sync byte.
    pub fn new() -> Self {
        Self {
            state: State::SeekingSync,
        }
    }

    /// Consume one byte.
    ///
    /// Returns `None` while a frame is incomplete, `Some(Ok(_))` for a valid
    /// frame and `Some(Err(_))` for a complete frame that failed validation.
    pub fn push(&mut self, byte: u8) -> Option<Result<Message>> {
        match &mut self.state {
            State::SeekingSync => {
                if byte == SYNC {
                    self.state = State::ReadingLength;
                }
                None
            }
            State::ReadingLength => {
                let len = byte as usize;
                let mut frame = BytesMut::with_capacity(len + FRAME_OVERHEAD);
                frame.put_u8(SYNC);
                frame.put_u8(byte);
                self.state = State::Assembling {
                    frame,
                    remaining: len + 2,
                };
                None
            }
            State::Assembling { frame, remaining } => {
                frame.put_u8(byte);
                *remaining -= 1;
                if *remaining > 0 {
                    return None;
                }
                let result = decode_message(frame);
                self.state = State::SeekingSync;
                Some(result)
            }
        }
    }

    /// Consume a run of bytes, yielding every completed frame in order.
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = Result<Message>> + 'a {
        bytes.iter().filter_map(move |&byte| self.push(byte))
    }

    /// True when no partial frame is held.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::SeekingSync)
    }

    /// Number of buffered bytes belonging to an incomplete frame.
    pub fn pending_len(&self) -> usize {
        match &self.state {
            State::SeekingSync => 0,
            State::ReadingLength => 1,
            State::Assembling { frame, .. } => frame.len(),
        }
    }

    /// Discard any partial frame and go back to scanning for sync.
    pub fn reset(&mut self) {
        self.state = State::SeekingSync;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

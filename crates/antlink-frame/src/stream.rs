//! `tokio_util::codec` adapter for async byte streams.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::{encode_message, Message};
use crate::decoder::FrameDecoder;
use crate::error::FrameError;

/// Frames ANT messages over any `AsyncRead`/`AsyncWrite`.
///
/// Decoding follows [`FrameDecoder`]: corrupt frames are skipped and the
/// stream resynchronizes on the next sync byte.
#[derive(Debug, Default)]
pub struct AntCodec {
    decoder: FrameDecoder,
    rejected: u64,
}

impl AntCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames skipped because they failed validation.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl Decoder for AntCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, FrameError> {
        while src.has_remaining() {
            let byte = src.get_u8();
            match self.decoder.push(byte) {
                Some(Ok(message)) => return Ok(Some(message)),
                Some(Err(err)) => {
                    self.rejected += 1;
                    debug!(error = %err, "skipping corrupt frame");
                }
                None => {}
            }
        }
        Ok(None)
    }
}

impl Encoder<Message> for AntCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_message(&item, dst)
    }
}

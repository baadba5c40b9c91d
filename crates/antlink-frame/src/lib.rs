//! ANT serial message framing.
//!
//! Every message on the wire is framed as:
//! - a sync byte (`0xA4`)
//! - a 1-byte payload length
//! - a 1-byte message id
//! - the payload
//! - a 1-byte XOR checksum over everything before it
//!
//! [`FrameDecoder`] recovers frames from an unframed byte stream, skipping
//! garbage and corrupt frames.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod ids;
pub mod response;

#[cfg(feature = "async")]
pub mod stream;

pub use codec::{checksum, decode_message, encode_message, Message, FRAME_OVERHEAD, MAX_PAYLOAD, SYNC};
pub use decoder::FrameDecoder;
pub use error::{FrameError, Result};
pub use ids::message_name;
pub use response::{code_name, ChannelResponse};

#[cfg(feature = "async")]
pub use stream::AntCodec;

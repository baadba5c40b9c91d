/// Errors that can occur during frame encoding/decoding.
///
/// Everything except `PayloadTooLarge` and `Io` is an integrity failure: the
/// frame arrived but cannot be trusted, and a stream decoder skips it.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The first byte is not the sync byte.
    #[error("invalid sync byte 0x{found:02X} (expected 0xA4)")]
    InvalidSync { found: u8 },

    /// Fewer bytes than the smallest possible frame.
    #[error("frame too short ({len} bytes, min 4)")]
    TooShort { len: usize },

    /// The length byte disagrees with the number of bytes supplied.
    #[error("length byte declares {declared} payload bytes but frame holds {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// The trailing XOR checksum does not match the frame contents.
    #[error("checksum mismatch (computed 0x{computed:02X}, found 0x{found:02X})")]
    ChecksumMismatch { computed: u8, found: u8 },

    /// The payload does not fit the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred underneath a stream codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True for failures that mean "corrupt frame, resynchronize".
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidSync { .. }
                | FrameError::TooShort { .. }
                | FrameError::LengthMismatch { .. }
                | FrameError::ChecksumMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

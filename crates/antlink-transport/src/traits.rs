use std::io::ErrorKind;

use crate::error::{Result, TransportError};

/// A byte-stream connection to an ANT device.
///
/// Implementations wrap a USB bulk endpoint, a serial tty or a test double.
/// `read` is expected to be non-blocking or to use a short timeout: returning
/// an error because nothing is ready is normal and callers retry.
pub trait Transport: Send {
    /// Acquire the underlying device.
    fn open(&mut self) -> Result<()>;

    /// Release the underlying device. Closing twice is harmless.
    fn close(&mut self);

    /// Read whatever is available into `buf`, returning the byte count.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write some prefix of `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Preferred size of the scratch buffer handed to `read`.
    fn buffer_size(&self) -> usize;

    /// Write every byte of `bytes`, retrying short and interrupted writes.
    ///
    /// `WouldBlock` is returned to the caller rather than retried, so on a
    /// non-blocking device some prefix of `bytes` may already be written.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::WriteZero { len: bytes.len() }),
                Ok(n) => offset += n,
                Err(TransportError::Io(err)) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn buffer_size(&self) -> usize {
        (**self).buffer_size()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }
}

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Line settings for a serial-attached ANT device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate. ANT USB2 sticks run at 57600, ANTUSB-m at 115200.
    pub baud_rate: u32,
    /// Scratch buffer size reported through [`Transport::buffer_size`].
    pub buffer_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 57_600,
            buffer_size: 64,
        }
    }
}

/// Serial tty transport (Linux/macOS).
///
/// The device is opened non-blocking in raw mode, so `read` returns
/// `WouldBlock` immediately when the stick has nothing to say.
pub struct SerialPort {
    path: PathBuf,
    config: SerialConfig,
    file: Option<File>,
}

impl SerialPort {
    /// Describe a serial device without opening it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_config(path, SerialConfig::default())
    }

    /// Describe a serial device with explicit line settings.
    pub fn with_config(path: impl AsRef<Path>, config: SerialConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            file: None,
        }
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Line settings.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Whether the device is currently open.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "serial"
    }

    fn configure(&self, file: &File) -> Result<()> {
        let speed = baud_constant(self.config.baud_rate).ok_or_else(|| {
            TransportError::Configure {
                device: self.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("unsupported baud rate {}", self.config.baud_rate),
                ),
            }
        })?;
        let fd = file.as_raw_fd();
        let configure_err = |source: std::io::Error| TransportError::Configure {
            device: self.path.clone(),
            source,
        };

        // SAFETY: `termios` is plain data; `tcgetattr` fully initializes it on success
        // and `fd` is an open descriptor owned by `file` for the duration of this call.
        let mut tio: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
            return Err(configure_err(std::io::Error::last_os_error()));
        }

        // SAFETY: `tio` was initialized by `tcgetattr` above.
        unsafe {
            libc::cfmakeraw(&mut tio);
            libc::cfsetispeed(&mut tio, speed);
            libc::cfsetospeed(&mut tio, speed);
        }
        tio.c_cflag |= libc::CLOCAL | libc::CREAD;
        tio.c_cc[libc::VMIN] = 0;
        tio.c_cc[libc::VTIME] = 0;

        // SAFETY: `fd` is open and `tio` is a valid termios value.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
            return Err(configure_err(std::io::Error::last_os_error()));
        }
        // SAFETY: `fd` is open; discarding stale bytes is best-effort.
        unsafe {
            libc::tcflush(fd, libc::TCIOFLUSH);
        }
        Ok(())
    }
}

impl Transport for SerialPort {
    fn open(&mut self) -> Result<()> {
        if self.file.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&self.path)
            .map_err(|source| TransportError::Open {
                device: self.path.clone(),
                source,
            })?;
        self.configure(&file)?;

        info!(path = ?self.path, baud = self.config.baud_rate, "opened serial device");
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            debug!(path = ?self.path, "closed serial device");
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let file = self.file.as_mut().ok_or(TransportError::NotOpen)?;
        Ok(file.read(buf)?)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let file = self.file.as_mut().ok_or(TransportError::NotOpen)?;
        let n = file.write(bytes)?;
        file.flush()?;
        Ok(n)
    }

    fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud_rate", &self.config.baud_rate)
            .field("open", &self.file.is_some())
            .finish()
    }
}

fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        _ => return None,
    };
    Some(speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_usb2_stick() {
        let port = SerialPort::new("/dev/ttyUSB0");
        assert_eq!(port.config().baud_rate, 57_600);
        assert_eq!(port.buffer_size(), 64);
        assert!(!port.is_open());
    }

    #[test]
    fn open_missing_device_fails() {
        let mut port = SerialPort::new("/dev/antlink-does-not-exist");
        let err = port.open().unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
        assert!(!port.is_open());
    }

    #[test]
    fn open_non_tty_fails_configuration() {
        let mut port = SerialPort::new("/dev/null");
        let err = port.open().unwrap_err();
        assert!(matches!(err, TransportError::Configure { .. }));
        assert!(!port.is_open());
    }

    #[test]
    fn unsupported_baud_rate_rejected() {
        assert!(baud_constant(12_345).is_none());
        assert!(baud_constant(115_200).is_some());

        let mut port = SerialPort::with_config(
            "/dev/null",
            SerialConfig {
                baud_rate: 12_345,
                ..SerialConfig::default()
            },
        );
        let err = port.open().unwrap_err();
        assert!(
            matches!(err, TransportError::Configure { source, .. } if source.kind() == std::io::ErrorKind::InvalidInput)
        );
    }

    #[test]
    fn io_before_open_is_rejected() {
        let mut port = SerialPort::new("/dev/ttyUSB0");
        assert!(matches!(
            port.read(&mut [0u8; 8]),
            Err(TransportError::NotOpen)
        ));
        assert!(matches!(port.write(b"x"), Err(TransportError::NotOpen)));
        port.close();
    }
}

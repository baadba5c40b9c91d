//! Byte-stream transport abstraction for ANT radio devices.
//!
//! Everything above this crate talks to hardware through the [`Transport`]
//! trait: open, close, non-blocking read, write, and a preferred buffer size.
//! A raw-mode serial tty implementation is provided on Unix.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::Transport;

#[cfg(unix)]
pub use serial::{SerialConfig, SerialPort};

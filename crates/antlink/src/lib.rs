//! ANT/ANT+ radio driver.
//!
//! antlink talks to ANT USB sticks and serial modules: it frames protocol
//! messages, runs a background pump that keeps the device serviced, and
//! builds the channel configuration and data commands an application needs.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream device abstraction and a serial tty transport
//! - [`frame`]: message ids, frame codec and a resynchronizing stream decoder
//! - [`session`]: threaded session and command layer (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use antlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use antlink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use antlink_session::*;
}

//! The I/O pump: sole owner of the transport while a session runs.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use antlink_frame::Message;
use antlink_transport::{Transport, TransportError};
use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::event::{EventSink, Lane, SessionEvent};

/// Channel ends owned by the pump thread.
pub(crate) struct PumpChannels {
    pub shutdown: Receiver<()>,
    pub timeslot: Receiver<Message>,
    pub queued: Receiver<Message>,
    pub bytes: Sender<Bytes>,
}

/// What the pump hands back when it exits.
pub(crate) struct PumpExit<T> {
    pub transport: T,
    pub result: Result<(), TransportError>,
}

/// A frame the transport has not fully accepted yet.
struct PendingWrite {
    lane: Lane,
    id: u8,
    frame: Bytes,
    offset: usize,
}

enum Progress {
    Complete,
    Partial,
    Blocked,
}

impl PendingWrite {
    /// Offer the unwritten tail of the frame to the transport once.
    fn flush<T: Transport>(&mut self, transport: &mut T) -> Result<Progress, TransportError> {
        match transport.write(&self.frame[self.offset..]) {
            Ok(0) => Err(TransportError::WriteZero {
                len: self.frame.len(),
            }),
            Ok(n) => {
                self.offset += n;
                if self.offset >= self.frame.len() {
                    Ok(Progress::Complete)
                } else {
                    Ok(Progress::Partial)
                }
            }
            Err(err) if err.is_would_block() => Ok(Progress::Blocked),
            Err(err) => Err(err),
        }
    }
}

enum Action {
    Shutdown,
    Flush,
    Write(Lane, Message),
    Read,
}

impl PumpChannels {
    /// Strict priority: shutdown, an unfinished frame, timeslot writes,
    /// queued writes, then a read. No new message is taken while a frame
    /// is still pending.
    fn next_action(&self, pending: bool) -> Action {
        match self.shutdown.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return Action::Shutdown,
            Err(TryRecvError::Empty) => {}
        }
        if pending {
            return Action::Flush;
        }
        if let Ok(message) = self.timeslot.try_recv() {
            return Action::Write(Lane::Timeslot, message);
        }
        if let Ok(message) = self.queued.try_recv() {
            return Action::Write(Lane::Queued, message);
        }
        Action::Read
    }
}

fn idle(backoff: Option<Duration>) {
    match backoff {
        Some(backoff) => thread::sleep(backoff),
        None => thread::yield_now(),
    }
}

/// Poll the transport once. Returns false when the decoder has gone away.
fn read_once<T: Transport>(
    transport: &mut T,
    scratch: &mut [u8],
    bytes: &Sender<Bytes>,
    idle_backoff: Option<Duration>,
) -> bool {
    match transport.read(scratch) {
        Ok(n) if n > 0 => bytes.send(Bytes::copy_from_slice(&scratch[..n])).is_ok(),
        Ok(_) | Err(_) => {
            idle(idle_backoff);
            true
        }
    }
}

/// Run the pump loop until shutdown or a fatal write failure.
///
/// Each pass makes at most one transport call, so a device that stops
/// accepting bytes never keeps the loop from seeing shutdown. On exit the
/// transport is closed and every channel end is dropped, which ends the
/// decoder thread and fails any further outbound sends.
pub(crate) fn run<T: Transport>(
    mut transport: T,
    channels: PumpChannels,
    mut scratch: Vec<u8>,
    idle_backoff: Option<Duration>,
    sink: Arc<dyn EventSink>,
) -> PumpExit<T> {
    let mut pending: Option<PendingWrite> = None;
    let result = loop {
        match channels.next_action(pending.is_some()) {
            Action::Shutdown => break Ok(()),
            Action::Write(lane, message) => match message.encode() {
                Ok(frame) => {
                    pending = Some(PendingWrite {
                        lane,
                        id: message.id,
                        frame,
                        offset: 0,
                    })
                }
                Err(err) => sink.event(&SessionEvent::EncodeFailed {
                    lane,
                    id: message.id,
                    reason: err.to_string(),
                }),
            },
            Action::Flush => {
                let Some(write) = pending.as_mut() else {
                    continue;
                };
                match write.flush(&mut transport) {
                    Ok(Progress::Complete) => {
                        sink.event(&SessionEvent::MessageWritten {
                            lane: write.lane,
                            id: write.id,
                            len: write.frame.len(),
                        });
                        pending = None;
                    }
                    Ok(Progress::Partial) => {}
                    Ok(Progress::Blocked) => {
                        // Keep inbound flowing while the device is full.
                        if !read_once(&mut transport, &mut scratch, &channels.bytes, idle_backoff) {
                            break Ok(());
                        }
                    }
                    Err(err) => {
                        sink.event(&SessionEvent::PumpFailed {
                            reason: err.to_string(),
                        });
                        break Err(err);
                    }
                }
            }
            Action::Read => {
                if !read_once(&mut transport, &mut scratch, &channels.bytes, idle_backoff) {
                    // Decoder is gone; nothing left to feed.
                    break Ok(());
                }
            }
        }
    };

    transport.close();
    drop(channels);
    drop(scratch);
    PumpExit { transport, result }
}

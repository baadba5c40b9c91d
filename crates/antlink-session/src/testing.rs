//! Scripted transport and recording sink shared by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use antlink_frame::{FrameDecoder, Message};
use antlink_transport::{Result, Transport, TransportError};

use crate::event::{EventSink, SessionEvent};

#[derive(Default)]
struct MockState {
    opened: usize,
    closed: usize,
    is_open: bool,
    inbound: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    fail_open: bool,
    fail_writes: bool,
    block_writes: bool,
    write_chunk: Option<usize>,
    write_attempts: usize,
}

/// In-memory transport. Clones share state so a test can inspect what the
/// pump thread did with its copy.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Queue a chunk returned by one future `read` call.
    pub fn push_inbound(&self, chunk: &[u8]) {
        self.lock().inbound.push_back(chunk.to_vec());
    }

    pub fn inbound_is_empty(&self) -> bool {
        self.lock().inbound.is_empty()
    }

    pub fn fail_open(&self) {
        self.lock().fail_open = true;
    }

    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    /// While set, every `write` reports `WouldBlock`.
    pub fn block_writes(&self, blocked: bool) {
        self.lock().block_writes = blocked;
    }

    /// Accept at most `chunk` bytes per `write`.
    pub fn limit_writes(&self, chunk: usize) {
        self.lock().write_chunk = Some(chunk);
    }

    pub fn write_attempts(&self) -> usize {
        self.lock().write_attempts
    }

    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    pub fn is_closed(&self) -> bool {
        let state = self.lock();
        state.closed > 0 && !state.is_open
    }

    pub fn written_bytes(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Every frame written so far, decoded.
    pub fn written(&self) -> Vec<Message> {
        let bytes = self.written_bytes();
        FrameDecoder::new()
            .feed(&bytes)
            .map(|r| r.unwrap())
            .collect()
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.fail_open {
            return Err(TransportError::Open {
                device: PathBuf::from("mock"),
                source: io::Error::new(io::ErrorKind::NotFound, "no device"),
            });
        }
        state.opened += 1;
        state.is_open = true;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.lock();
        state.closed += 1;
        state.is_open = false;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.lock();
        match state.inbound.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    state.inbound.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
            None => Err(TransportError::Io(io::ErrorKind::WouldBlock.into())),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut state = self.lock();
        state.write_attempts += 1;
        if state.block_writes {
            return Err(TransportError::Io(io::ErrorKind::WouldBlock.into()));
        }
        if state.fail_writes {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device unplugged",
            )));
        }
        let n = state.write_chunk.map_or(bytes.len(), |chunk| chunk.min(bytes.len()));
        state.written.extend_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn buffer_size(&self) -> usize {
        16
    }
}

/// Keeps every event it sees.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn event(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Spin until `cond` holds, failing the test after a few seconds.
pub(crate) fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

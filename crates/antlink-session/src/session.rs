use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use antlink_frame::{Message, MAX_PAYLOAD};
use antlink_transport::Transport;
use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::event::{DecoderStats, EventSink, Lane, SessionEvent, TracingSink};
use crate::inbound;
use crate::pump::{self, PumpChannels, PumpExit};

/// Handle for enqueuing outbound messages on a running session.
///
/// Cheap to clone. Every send is a hand-off to the pump thread and returns
/// once the pump has taken the message, so messages sent from one thread on
/// one lane are written in the order sent.
#[derive(Debug, Clone)]
pub struct Outbound {
    queued: Sender<Message>,
    timeslot: Sender<Message>,
}

impl Outbound {
    pub(crate) fn new(queued: Sender<Message>, timeslot: Sender<Message>) -> Self {
        Self { queued, timeslot }
    }

    /// Enqueue a configuration or control message.
    pub fn write_queued(&self, message: Message) -> Result<()> {
        self.send(Lane::Queued, message)
    }

    /// Enqueue a message the pump writes ahead of queued traffic.
    pub fn write_in_timeslot(&self, message: Message) -> Result<()> {
        self.send(Lane::Timeslot, message)
    }

    fn send(&self, lane: Lane, message: Message) -> Result<()> {
        if message.payload.len() > MAX_PAYLOAD {
            return Err(SessionError::invalid(format!(
                "payload of {} bytes exceeds {MAX_PAYLOAD}",
                message.payload.len()
            )));
        }
        let tx = match lane {
            Lane::Queued => &self.queued,
            Lane::Timeslot => &self.timeslot,
        };
        tx.send(message).map_err(|_| SessionError::Disconnected)
    }
}

struct Running<T> {
    shutdown: Sender<()>,
    outbound: Outbound,
    inbound: Receiver<Message>,
    pump: JoinHandle<PumpExit<T>>,
    decoder: JoinHandle<DecoderStats>,
}

/// One ANT device session: a transport plus the pump and decoder threads
/// that service it while started.
///
/// ```no_run
/// # fn demo(port: antlink_transport::SerialPort) -> antlink_session::Result<()> {
/// use antlink_session::Session;
///
/// let mut session = Session::new(port);
/// session.start()?;
/// session.outbound()?.reset_system()?;
/// while let Some(message) = session.recv_timeout(std::time::Duration::from_secs(1))? {
///     println!("0x{:02X}", message.id);
/// }
/// session.stop()?;
/// # Ok(())
/// # }
/// ```
pub struct Session<T: Transport + 'static> {
    transport: Option<T>,
    config: SessionConfig,
    sink: Arc<dyn EventSink>,
    running: Option<Running<T>>,
}

impl<T: Transport + 'static> Session<T> {
    /// Create an inert session owning `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            config: SessionConfig::default(),
            sink: Arc::new(TracingSink),
            running: None,
        }
    }

    /// Override session config. Takes effect at the next `start`.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Route session events to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Open the transport and spawn the pump and decoder threads.
    ///
    /// If the transport fails to open, the error is returned and nothing is
    /// spawned; the session stays inert and may be started again.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(SessionError::AlreadyRunning);
        }
        let transport = self
            .transport
            .as_mut()
            .ok_or(SessionError::TransportUnavailable)?;
        transport.open()?;

        let buffer_size = transport.buffer_size().max(1);
        let scratch = vec![0u8; buffer_size];

        let (shutdown_tx, shutdown_rx) = bounded(1);
        let (queued_tx, queued_rx) = bounded(0);
        let (timeslot_tx, timeslot_rx) = bounded(0);
        let (bytes_tx, bytes_rx) = bounded::<Bytes>(0);
        let (inbound_tx, inbound_rx) = bounded(self.config.inbound_capacity);

        let prefix = &self.config.thread_name;
        let decoder_sink = Arc::clone(&self.sink);
        let decoder = thread::Builder::new()
            .name(format!("{prefix}-decoder"))
            .spawn(move || inbound::run(bytes_rx, inbound_tx, decoder_sink.as_ref()));
        let decoder = match decoder {
            Ok(handle) => handle,
            Err(source) => {
                if let Some(transport) = self.transport.as_mut() {
                    transport.close();
                }
                return Err(SessionError::Spawn {
                    unit: "decoder",
                    source,
                });
            }
        };

        let transport = self
            .transport
            .take()
            .ok_or(SessionError::TransportUnavailable)?;
        let channels = PumpChannels {
            shutdown: shutdown_rx,
            timeslot: timeslot_rx,
            queued: queued_rx,
            bytes: bytes_tx,
        };
        let idle_backoff = self.config.idle_backoff();
        let pump_sink = Arc::clone(&self.sink);
        let pump = thread::Builder::new()
            .name(format!("{prefix}-pump"))
            .spawn(move || pump::run(transport, channels, scratch, idle_backoff, pump_sink));
        let pump = match pump {
            Ok(handle) => handle,
            Err(source) => {
                // The closure, and the transport with it, was dropped, which
                // also closed the byte channel.
                let _ = decoder.join();
                return Err(SessionError::Spawn {
                    unit: "pump",
                    source,
                });
            }
        };

        self.running = Some(Running {
            shutdown: shutdown_tx,
            outbound: Outbound::new(queued_tx, timeslot_tx),
            inbound: inbound_rx,
            pump,
            decoder,
        });
        self.sink.event(&SessionEvent::Started { buffer_size });
        Ok(())
    }

    /// Signal shutdown and wait for both threads to finish.
    ///
    /// The transport is closed and handed back to the session before this
    /// returns. A write failure that ended the pump early is returned here.
    pub fn stop(&mut self) -> Result<DecoderStats> {
        let running = self.running.take().ok_or(SessionError::NotRunning)?;
        let Running {
            shutdown,
            outbound,
            inbound,
            pump,
            decoder,
        } = running;

        // The pump may already be gone after a write failure.
        let _ = shutdown.send(());
        drop(outbound);

        let pump_result = match pump.join() {
            Ok(exit) => {
                self.transport = Some(exit.transport);
                exit.result.map_err(SessionError::from)
            }
            Err(_) => Err(SessionError::ThreadPanicked("pump")),
        };
        let stats = decoder
            .join()
            .map_err(|_| SessionError::ThreadPanicked("decoder"));
        drop(inbound);

        let stats = match (pump_result, stats) {
            (Err(err), _) | (Ok(()), Err(err)) => {
                debug!(error = %err, "session stopped with error");
                return Err(err);
            }
            (Ok(()), Ok(stats)) => stats,
        };
        self.sink.event(&SessionEvent::Stopped { stats });
        Ok(stats)
    }

    /// Outbound handle for the command layer. Fails on an inert session.
    pub fn outbound(&self) -> Result<Outbound> {
        self.running
            .as_ref()
            .map(|r| r.outbound.clone())
            .ok_or(SessionError::NotRunning)
    }

    /// Enqueue a configuration or control message.
    pub fn write_queued(&self, message: Message) -> Result<()> {
        self.running()?.outbound.write_queued(message)
    }

    /// Enqueue a message the pump writes ahead of queued traffic.
    pub fn write_in_timeslot(&self, message: Message) -> Result<()> {
        self.running()?.outbound.write_in_timeslot(message)
    }

    /// Next decoded message, if one is ready. Never blocks.
    ///
    /// Returns `None` on an inert or stopped session.
    pub fn try_recv(&self) -> Option<Message> {
        self.running.as_ref()?.inbound.try_recv().ok()
    }

    /// Wait up to `timeout` for the next decoded message.
    ///
    /// Returns `Ok(None)` on timeout and `Disconnected` once the decoder has
    /// finished after a pump failure.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Message>> {
        match self.running()?.inbound.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SessionError::Disconnected),
        }
    }

    fn running(&self) -> Result<&Running<T>> {
        self.running.as_ref().ok_or(SessionError::NotRunning)
    }
}

impl<T: Transport + 'static> Drop for Session<T> {
    fn drop(&mut self) {
        if self.running.is_some() {
            if let Err(err) = self.stop() {
                debug!(error = %err, "session stop on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use antlink_frame::ids;

    use super::*;
    use crate::testing::{wait_until, MockTransport, RecordingSink};

    fn session(mock: &MockTransport) -> (Session<MockTransport>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let session = Session::new(mock.clone()).with_sink(sink.clone());
        (session, sink)
    }

    fn frame(id: u8, payload: &[u8]) -> Vec<u8> {
        Message::new(id, payload.to_vec()).encode().unwrap().to_vec()
    }

    #[test]
    fn start_then_stop() {
        let mock = MockTransport::new();
        let (mut session, sink) = session(&mock);

        session.start().unwrap();
        assert!(session.is_running());
        assert_eq!(mock.opened(), 1);

        let stats = session.stop().unwrap();
        assert_eq!(stats, DecoderStats::default());
        assert!(!session.is_running());
        assert!(mock.is_closed());
        assert!(session.try_recv().is_none());

        let events = sink.events();
        assert_eq!(events[0], SessionEvent::Started { buffer_size: 16 });
        assert_eq!(events.last(), Some(&SessionEvent::Stopped { stats }));
    }

    #[test]
    fn open_failure_spawns_nothing() {
        let mock = MockTransport::new();
        mock.fail_open();
        let (mut session, sink) = session(&mock);

        let err = session.start().unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert!(!session.is_running());
        assert!(sink.events().is_empty());
        assert!(matches!(session.outbound(), Err(SessionError::NotRunning)));
    }

    #[test]
    fn stop_without_start_is_an_error() {
        let mock = MockTransport::new();
        let (mut session, _) = session(&mock);
        assert!(matches!(session.stop(), Err(SessionError::NotRunning)));

        session.start().unwrap();
        session.stop().unwrap();
        assert!(matches!(session.stop(), Err(SessionError::NotRunning)));
    }

    #[test]
    fn double_start_is_rejected() {
        let mock = MockTransport::new();
        let (mut session, _) = session(&mock);
        session.start().unwrap();
        assert!(matches!(session.start(), Err(SessionError::AlreadyRunning)));
        session.stop().unwrap();
    }

    #[test]
    fn inbound_frames_reach_consumer() {
        let mock = MockTransport::new();
        mock.push_inbound(&frame(ids::STARTUP, &[0x20]));
        let (mut session, _) = session(&mock);

        session.start().unwrap();
        let msg = session
            .recv_timeout(Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(msg.id, ids::STARTUP);
        assert_eq!(msg.payload.as_ref(), &[0x20]);

        let stats = session.stop().unwrap();
        assert_eq!(stats.decoded, 1);
    }

    #[test]
    fn resynchronizes_after_corrupt_frame() {
        let mut bad = frame(ids::CHANNEL_EVENT, &[0, 0x42, 0]);
        bad[4] ^= 0x10;
        let mut wire = vec![0x00, 0x13];
        wire.extend_from_slice(&bad);
        wire.extend_from_slice(&frame(ids::CHANNEL_EVENT, &[0, 0x4B, 0]));

        let mock = MockTransport::new();
        mock.push_inbound(&wire);
        let (mut session, _) = session(&mock);
        session.start().unwrap();

        let msg = session
            .recv_timeout(Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(msg.payload.as_ref(), &[0, 0x4B, 0]);
        let stats = session.stop().unwrap();
        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn queued_messages_are_written_in_order() {
        let mock = MockTransport::new();
        let (mut session, _) = session(&mock);
        session.start().unwrap();

        let sent = vec![
            Message::new(ids::SYSTEM_RESET, vec![0]),
            Message::new(ids::ASSIGN_CHANNEL, vec![0, 0, 0]),
            Message::new(ids::OPEN_CHANNEL, vec![0]),
        ];
        for msg in &sent {
            session.write_queued(msg.clone()).unwrap();
        }
        wait_until(|| mock.written().len() == 3);
        session.stop().unwrap();

        let mut expected = Vec::new();
        for msg in &sent {
            expected.extend_from_slice(&msg.encode().unwrap());
        }
        assert_eq!(mock.written_bytes(), expected);
    }

    #[test]
    fn timeslot_messages_are_written() {
        let mock = MockTransport::new();
        let (mut session, sink) = session(&mock);
        session.start().unwrap();

        let msg = Message::new(ids::ACKNOWLEDGED_DATA, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
        session.write_in_timeslot(msg.clone()).unwrap();
        wait_until(|| mock.written().len() == 1);
        session.stop().unwrap();

        assert_eq!(mock.written(), vec![msg]);
        assert!(sink.events().contains(&SessionEvent::MessageWritten {
            lane: Lane::Timeslot,
            id: ids::ACKNOWLEDGED_DATA,
            len: 13,
        }));
    }

    #[test]
    fn write_failure_is_fatal_and_reported_by_stop() {
        let mock = MockTransport::new();
        mock.fail_writes();
        let (mut session, _) = session(&mock);
        session.start().unwrap();

        let outbound = session.outbound().unwrap();
        outbound
            .write_queued(Message::new(ids::SYSTEM_RESET, vec![0]))
            .unwrap();
        wait_until(|| mock.is_closed());

        assert!(matches!(
            outbound.write_queued(Message::new(ids::OPEN_CHANNEL, vec![0])),
            Err(SessionError::Disconnected)
        ));
        assert!(matches!(session.stop(), Err(SessionError::Transport(_))));
        assert!(!session.is_running());
    }

    #[test]
    fn stop_returns_while_writer_is_blocked() {
        let mock = MockTransport::new();
        mock.block_writes(true);
        let (mut session, _) = session(&mock);
        session.start().unwrap();
        session
            .write_queued(Message::new(ids::SYSTEM_RESET, vec![0]))
            .unwrap();
        wait_until(|| mock.write_attempts() > 1);

        let (done_tx, done_rx) = bounded(1);
        thread::spawn(move || {
            let _ = done_tx.send(session.stop().is_ok());
        });
        let stopped = done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("stop() did not return with the writer blocked");
        assert!(stopped);
        assert!(mock.written_bytes().is_empty());
        assert!(mock.is_closed());
    }

    #[test]
    fn burst_packets_reach_the_transport_in_sequence() {
        let mock = MockTransport::new();
        let (mut session, _) = session(&mock);
        session.start().unwrap();

        session
            .outbound()
            .unwrap()
            .send_burst_transfer(2, &[0; 64])
            .unwrap();
        wait_until(|| mock.written().len() == 8);
        session.stop().unwrap();

        let written = mock.written();
        assert!(written.iter().all(|m| m.id == ids::BURST_DATA));
        let sequence: Vec<u8> = written.iter().map(|m| m.payload[0]).collect();
        assert_eq!(sequence, vec![2, 34, 66, 98, 34, 66, 98, 162]);
    }

    #[test]
    fn oversized_payload_is_rejected_before_enqueue() {
        let mock = MockTransport::new();
        let (mut session, _) = session(&mock);
        session.start().unwrap();

        let err = session
            .write_queued(Message::new(ids::BROADCAST_DATA, vec![0; MAX_PAYLOAD + 1]))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
        session.stop().unwrap();
        assert!(mock.written().is_empty());
    }

    #[test]
    fn slow_consumer_loses_frames() {
        let mut wire = Vec::new();
        for channel in 0..3u8 {
            wire.extend_from_slice(&frame(ids::BROADCAST_DATA, &[channel, 0, 0, 0, 0, 0, 0, 0, 0]));
        }
        let mock = MockTransport::new();
        mock.push_inbound(&wire);
        let (mut session, _) = {
            let sink = Arc::new(RecordingSink::default());
            let session = Session::new(mock.clone())
                .with_sink(sink.clone())
                .with_config(SessionConfig {
                    inbound_capacity: 1,
                    ..SessionConfig::default()
                });
            (session, sink)
        };
        session.start().unwrap();
        wait_until(|| mock.inbound_is_empty());

        let stats = session.stop().unwrap();
        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn partial_frame_is_discarded_at_stop() {
        let wire = frame(ids::NETWORK_KEY, &[0; 9]);
        let mock = MockTransport::new();
        mock.push_inbound(&wire[..5]);
        let (mut session, _) = session(&mock);
        session.start().unwrap();
        wait_until(|| mock.inbound_is_empty());

        let stats = session.stop().unwrap();
        assert_eq!(stats.decoded, 0);
        assert_eq!(stats.discarded_bytes, 5);
        assert!(session.try_recv().is_none());
    }

    #[test]
    fn session_can_be_restarted() {
        let mock = MockTransport::new();
        let (mut session, _) = session(&mock);

        session.start().unwrap();
        session.stop().unwrap();
        mock.push_inbound(&frame(ids::VERSION, b"AP2\0"));
        session.start().unwrap();
        assert_eq!(mock.opened(), 2);

        let msg = session
            .recv_timeout(Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(msg.id, ids::VERSION);
        session.stop().unwrap();
    }

    #[test]
    fn inert_session_rejects_io() {
        let mock = MockTransport::new();
        let (session, _) = session(&mock);
        assert!(session.try_recv().is_none());
        assert!(matches!(
            session.recv_timeout(Duration::from_millis(1)),
            Err(SessionError::NotRunning)
        ));
        assert!(matches!(
            session.write_queued(Message::new(ids::SYSTEM_RESET, vec![0])),
            Err(SessionError::NotRunning)
        ));
    }

    #[test]
    fn drop_stops_running_session() {
        let mock = MockTransport::new();
        {
            let (mut session, _) = session(&mock);
            session.start().unwrap();
        }
        assert!(mock.is_closed());
    }
}

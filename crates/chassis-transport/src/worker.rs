// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transmit and receive worker threads
//!
//! Each worker owns one connection and runs until its connection fails, the
//! peer violates the acknowledgment protocol, or the link is shut down. On
//! exit it publishes its final [`WorkerState`], shuts its socket down and
//! closes its queue so the application observes `Closed` instead of blocking.

use parking_lot::Mutex;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::common::{Message, TransportError, TransportResult};
use crate::framing::FrameCodec;
use crate::queue::MessageQueue;
use crate::stats::LinkCounters;

/// Lifecycle of one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    /// Ended by a link shutdown
    Stopped,
    /// Ended on its own; the link direction is permanently down
    Terminated { reason: String },
}

impl WorkerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }
}

/// What both workers share with the link
pub(crate) struct WorkerContext {
    pub codec: FrameCodec,
    /// Token bytes when acknowledgments are on
    pub ack_token: Option<Vec<u8>>,
    pub cancel: Arc<AtomicBool>,
    pub counters: Arc<LinkCounters>,
}

impl WorkerContext {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// Join handle plus the means to interrupt a blocked worker
pub(crate) struct WorkerHandle {
    label: &'static str,
    handle: Option<JoinHandle<()>>,
    state: Arc<Mutex<WorkerState>>,
    interrupt: TcpStream,
}

impl WorkerHandle {
    pub(crate) fn state(&self) -> WorkerState {
        self.state.lock().clone()
    }

    /// Unblock any read or write in progress on the worker's socket
    pub(crate) fn interrupt(&self) {
        // Fails harmlessly when the worker already shut the socket down
        let _ = self.interrupt.shutdown(Shutdown::Both);
    }

    /// Wait for the worker thread to exit
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("[{}] Worker panicked", self.label);
                *self.state.lock() = WorkerState::Terminated {
                    reason: "worker panicked".to_string(),
                };
            }
        }
    }
}

/// Start the transmit worker on the outbound connection
pub(crate) fn spawn_transmit(
    stream: TcpStream,
    queue: Arc<MessageQueue<Message>>,
    context: WorkerContext,
) -> TransportResult<WorkerHandle> {
    spawn_worker("chassis-tx", "CHASSIS-TX", stream, queue, context, transmit_loop)
}

/// Start the receive worker on the inbound connection
pub(crate) fn spawn_receive(
    stream: TcpStream,
    queue: Arc<MessageQueue<Message>>,
    context: WorkerContext,
) -> TransportResult<WorkerHandle> {
    spawn_worker("chassis-rx", "CHASSIS-RX", stream, queue, context, receive_loop)
}

type WorkerLoop = fn(&mut TcpStream, &MessageQueue<Message>, &mut WorkerContext) -> TransportResult<()>;

fn spawn_worker(
    thread_name: &str,
    label: &'static str,
    stream: TcpStream,
    queue: Arc<MessageQueue<Message>>,
    mut context: WorkerContext,
    body: WorkerLoop,
) -> TransportResult<WorkerHandle> {
    let interrupt = stream.try_clone()?;
    let state = Arc::new(Mutex::new(WorkerState::Running));
    let thread_state = Arc::clone(&state);

    let handle = thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || {
            let mut stream = stream;
            let result = body(&mut stream, &queue, &mut context);

            let final_state = match result {
                Ok(()) => {
                    debug!("[{}] Worker stopped", label);
                    WorkerState::Stopped
                }
                Err(e) if context.cancelled() => {
                    debug!("[{}] Worker stopped ({})", label, e);
                    WorkerState::Stopped
                }
                Err(e) => {
                    context.counters.record_error();
                    warn!("[{}] Worker terminated: {}", label, e);
                    WorkerState::Terminated {
                        reason: e.to_string(),
                    }
                }
            };

            // State is published before the queue closes, so anyone woken
            // by the close already sees the final state.
            *thread_state.lock() = final_state;
            let _ = stream.shutdown(Shutdown::Both);
            queue.close();
        })?;

    Ok(WorkerHandle {
        label,
        handle: Some(handle),
        state,
        interrupt,
    })
}

/// Send queued messages in order, one acknowledgment round trip each
///
/// The head is only removed after its transfer completed, so a message
/// caught by a connection failure stays in the queue.
fn transmit_loop(
    stream: &mut TcpStream,
    queue: &MessageQueue<Message>,
    context: &mut WorkerContext,
) -> TransportResult<()> {
    while !context.cancelled() {
        let message = match queue.peek_wait() {
            Ok(message) => message,
            Err(TransportError::Closed) => return Ok(()),
            Err(e) => return Err(e),
        };

        context.codec.write_frame(stream, message.as_bytes())?;
        debug!("[CHASSIS-TX] Sent {} bytes", message.size());

        if let Some(token) = &context.ack_token {
            let reply = context.codec.read_frame(stream)?;
            if reply != *token {
                return Err(TransportError::AckMismatch {
                    expected: String::from_utf8_lossy(token).into_owned(),
                    received: String::from_utf8_lossy(&reply).into_owned(),
                });
            }
            context.counters.record_ack_received();
        }

        queue.commit_front();
        context.counters.record_sent(message.size());
    }
    Ok(())
}

/// Read whole messages, acknowledge each, then hand it to the application
fn receive_loop(
    stream: &mut TcpStream,
    queue: &MessageQueue<Message>,
    context: &mut WorkerContext,
) -> TransportResult<()> {
    while !context.cancelled() {
        let bytes = context.codec.read_frame(stream)?;
        let message = Message::from_bytes(bytes)?;

        // Unacknowledged, so the peer still treats it as undelivered
        if context.cancelled() {
            debug!("[CHASSIS-RX] Discarding unacknowledged message during shutdown");
            return Ok(());
        }

        if let Some(token) = &context.ack_token {
            context.codec.write_frame(stream, token)?;
            context.counters.record_ack_sent();
        }

        debug!("[CHASSIS-RX] Received {} bytes", message.size());
        context.counters.record_received(message.size());

        match push_received(queue, message, context.ack_token.is_some()) {
            Ok(()) => {}
            Err(TransportError::Closed) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Hand a received message to the application
///
/// The queue only closes on shutdown; a message lost that way has already
/// been acknowledged when acks are on, so it is reported.
fn push_received(
    queue: &MessageQueue<Message>,
    message: Message,
    acknowledged: bool,
) -> TransportResult<()> {
    let text = acknowledged.then(|| message.as_str().to_owned());
    match queue.push(message) {
        Err(TransportError::Closed) => {
            if let Some(text) = text {
                warn!(
                    "[CHASSIS-RX] Link shut down; dropped acknowledged message {:?} ({} bytes)",
                    text,
                    text.len()
                );
            }
            Err(TransportError::Closed)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Framing;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::{Duration, Instant};

    fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn context(ack: bool) -> WorkerContext {
        WorkerContext {
            codec: FrameCodec::new(Framing::Datagram, 1024),
            ack_token: ack.then(|| b"OK".to_vec()),
            cancel: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(LinkCounters::default()),
        }
    }

    fn wait_for_exit(handle: &WorkerHandle) -> WorkerState {
        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.state().is_running() {
            assert!(Instant::now() < deadline, "worker did not exit");
            thread::sleep(Duration::from_millis(10));
        }
        handle.state()
    }

    #[test]
    fn test_transmit_commits_only_after_ack() {
        let (ours, mut peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        let ctx = context(true);
        let counters = Arc::clone(&ctx.counters);
        let mut handle = spawn_transmit(ours, Arc::clone(&queue), ctx).unwrap();

        queue.push(Message::new("arm")).unwrap();

        let mut buf = [0u8; 16];
        let n = peer.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"arm");

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.len(), 1);
        assert_eq!(counters.snapshot().messages_sent, 0);

        peer.write_all(b"OK").unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !queue.is_empty() {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(counters.snapshot().acks_received, 1);

        queue.close();
        handle.interrupt();
        handle.join();
    }

    #[test]
    fn test_transmit_ack_mismatch_terminates() {
        let (ours, mut peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        let handle = spawn_transmit(ours, Arc::clone(&queue), context(true)).unwrap();

        queue.push(Message::new("arm")).unwrap();
        let mut buf = [0u8; 16];
        peer.read(&mut buf).unwrap();
        peer.write_all(b"NO").unwrap();

        match wait_for_exit(&handle) {
            WorkerState::Terminated { reason } => assert!(reason.contains("mismatch")),
            other => panic!("unexpected state {:?}", other),
        }
        assert!(queue.is_closed());
        assert_eq!(queue.snapshot(), vec![Message::new("arm")]);
    }

    #[test]
    fn test_receive_acks_before_queueing() {
        let (ours, mut peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        let ctx = context(true);
        let counters = Arc::clone(&ctx.counters);
        let mut handle = spawn_receive(ours, Arc::clone(&queue), ctx).unwrap();

        peer.write_all(b"telemetry").unwrap();

        // The ack is not read yet, so only the worker's own ordering can
        // account for it being counted by the time the message is visible
        assert_eq!(queue.pop().unwrap(), "telemetry");
        let stats = counters.snapshot();
        assert_eq!(stats.acks_sent, 1);
        assert_eq!(stats.messages_received, 1);

        let mut ack = [0u8; 2];
        peer.read_exact(&mut ack).unwrap();
        assert_eq!(&ack, b"OK");

        handle.interrupt();
        handle.join();
        assert!(!handle.state().is_running());
    }

    #[test]
    fn test_receive_during_shutdown_is_not_acknowledged() {
        let (ours, mut peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        let ctx = context(true);
        let cancel = Arc::clone(&ctx.cancel);
        let counters = Arc::clone(&ctx.counters);
        let mut handle = spawn_receive(ours, Arc::clone(&queue), ctx).unwrap();

        // Worker is blocked reading when the shutdown begins
        thread::sleep(Duration::from_millis(50));
        cancel.store(true, Ordering::Release);
        peer.write_all(b"late").unwrap();

        // No ack, just the worker closing its end
        let mut buf = [0u8; 4];
        assert_eq!(peer.read(&mut buf).unwrap(), 0);

        handle.join();
        assert_eq!(handle.state(), WorkerState::Stopped);
        assert_eq!(counters.snapshot().acks_sent, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_receive_into_closed_queue_stops_worker() {
        let (ours, mut peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        queue.close();
        let mut handle = spawn_receive(ours, Arc::clone(&queue), context(true)).unwrap();

        peer.write_all(b"telemetry").unwrap();
        let mut ack = [0u8; 2];
        peer.read_exact(&mut ack).unwrap();
        assert_eq!(&ack, b"OK");

        handle.join();
        assert_eq!(handle.state(), WorkerState::Stopped);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_received_reports_closed_queue() {
        let queue = MessageQueue::unbounded();
        assert!(push_received(&queue, Message::new("a"), true).is_ok());
        queue.close();
        assert!(matches!(
            push_received(&queue, Message::new("b"), true),
            Err(TransportError::Closed)
        ));
        assert_eq!(queue.snapshot(), vec![Message::new("a")]);
    }

    #[test]
    fn test_receive_peer_close_terminates_and_closes_queue() {
        let (ours, peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        let handle = spawn_receive(ours, Arc::clone(&queue), context(false)).unwrap();

        drop(peer);
        assert!(matches!(queue.pop(), Err(TransportError::Closed)));
        assert!(handle.state().is_terminated());
    }

    #[test]
    fn test_receive_invalid_utf8_terminates() {
        let (ours, mut peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        let handle = spawn_receive(ours, Arc::clone(&queue), context(false)).unwrap();

        peer.write_all(&[0xff, 0xfe]).unwrap();
        assert!(matches!(wait_for_exit(&handle), WorkerState::Terminated { .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancelled_worker_reports_stopped() {
        let (ours, _peer) = socket_pair();
        let queue = Arc::new(MessageQueue::unbounded());
        let ctx = context(false);
        let cancel = Arc::clone(&ctx.cancel);
        let mut handle = spawn_receive(ours, Arc::clone(&queue), ctx).unwrap();

        cancel.store(true, Ordering::Release);
        handle.interrupt();
        handle.join();
        assert_eq!(handle.state(), WorkerState::Stopped);
    }
}

//! Per-connection session engine.
//!
//! A [`Session`] owns one graph and drives its connection through a strict
//! cycle: read one message, apply it, flush every queued event, read again.
//! Reads and writes never overlap, and nothing runs between cycles.

pub mod outbox;
pub mod state;

use std::time::Duration;

use metrics::counter;
use pathway_proto::Command;
use pathway_search::PathSearch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use crate::errors::{Result, SessionError};
use crate::graph::{Dispatch, IgnoreReason, SessionGraph};
use crate::metrics::{
    SESSION_COMMANDS_IGNORED_TOTAL, SESSION_COMMANDS_TOTAL, SESSION_EVENTS_WRITTEN_TOTAL,
};
use crate::transport::{Frame, Transport};

pub use outbox::Outbox;
pub use state::SessionState;

/// How long a session waits for the next message unless configured.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Counters reported when a session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Commands that took effect.
    pub commands_handled: u64,
    /// Messages dropped without side effects.
    pub commands_ignored: u64,
    /// Frames written to the client.
    pub events_written: u64,
}

/// One client's editing session.
pub struct Session {
    id: Uuid,
    state: SessionState,
    graph: SessionGraph,
    outbox: Outbox,
    stats: SessionStats,
    idle_timeout: Duration,
}

impl Session {
    /// Create a session around a fresh engine. The session starts in
    /// [`SessionState::Handshaking`].
    pub fn new(engine: Box<dyn PathSearch>) -> Self {
        Self {
            id: Uuid::now_v7(),
            state: SessionState::Handshaking,
            graph: SessionGraph::new(engine),
            outbox: Outbox::new(),
            stats: SessionStats::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Close the session when no message arrives within `idle_timeout`.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Log correlation ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The session's graph.
    pub fn graph(&self) -> &SessionGraph {
        &self.graph
    }

    /// Frames waiting to be written.
    pub fn pending_writes(&self) -> usize {
        self.outbox.len()
    }

    /// Drive the connection until the peer closes, a fault occurs, the
    /// client goes idle, or `shutdown` fires. Always tears the session down before returning.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn run<T: Transport>(
        &mut self,
        transport: &mut T,
        shutdown: CancellationToken,
    ) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        debug!("session started");
        let result = self.cycle(transport, &shutdown).await;
        self.teardown(transport).await;
        result
    }

    /// Decode `payload` and apply it to the graph.
    ///
    /// Malformed payloads and invalid commands are logged and reported as
    /// [`Dispatch::Ignored`]. Only engine faults are errors.
    pub fn dispatch(&mut self, payload: &[u8]) -> Result<Dispatch> {
        let outcome = match Command::decode(payload) {
            Ok(command) => {
                trace!(command = command.name(), "command decoded");
                counter!(SESSION_COMMANDS_TOTAL, "command" => command.name()).increment(1);
                self.graph.apply(command, &mut self.outbox)?
            }
            Err(error) => {
                warn!(%error, len = payload.len(), "malformed message, ignoring");
                Dispatch::Ignored(IgnoreReason::Malformed)
            }
        };

        match outcome {
            Dispatch::Applied => self.stats.commands_handled += 1,
            Dispatch::Ignored(reason) => {
                self.stats.commands_ignored += 1;
                counter!(SESSION_COMMANDS_IGNORED_TOTAL, "reason" => reason.as_str()).increment(1);
            }
        }
        Ok(outcome)
    }

    /// Write queued frames oldest first until the queue is empty.
    pub async fn drain_writes<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        if self.outbox.is_empty() {
            return Ok(());
        }
        self.transition(SessionState::Writing);
        while let Some(frame) = self.outbox.pop() {
            transport
                .send(frame)
                .await
                .map_err(|source| SessionError::Transport {
                    stage: SessionState::Writing,
                    source,
                })?;
            self.stats.events_written += 1;
            counter!(SESSION_EVENTS_WRITTEN_TOTAL).increment(1);
        }
        Ok(())
    }

    async fn cycle<T: Transport>(
        &mut self,
        transport: &mut T,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        let idle = self.idle_timeout;
        loop {
            self.transition(SessionState::Reading);
            let frame = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("server shutting down, closing session");
                    return Ok(());
                }
                frame = tokio::time::timeout(idle, transport.recv()) => match frame {
                    Ok(frame) => frame,
                    Err(_) => {
                        info!(?idle, "client idle, closing session");
                        return Err(SessionError::IdleTimeout(idle));
                    }
                },
            };

            let payload = match frame {
                Ok(Frame::Data(payload)) => payload,
                Ok(Frame::Control) => continue,
                Ok(Frame::Close) => {
                    debug!("peer closed connection");
                    return Ok(());
                }
                Err(source) => {
                    return Err(SessionError::Transport {
                        stage: SessionState::Reading,
                        source,
                    });
                }
            };

            self.transition(SessionState::Dispatching);
            let _ = self.dispatch(&payload)?;
            self.drain_writes(transport).await?;
        }
    }

    async fn teardown<T: Transport>(&mut self, transport: &mut T) {
        self.transition(SessionState::Closed);
        let discarded = self.outbox.clear();
        let released = self.graph.teardown();
        if let Err(error) = transport.close().await {
            debug!(%error, "close handshake not sent");
        }
        info!(
            commands_handled = self.stats.commands_handled,
            commands_ignored = self.stats.commands_ignored,
            events_written = self.stats.events_written,
            nodes_released = released,
            events_discarded = discarded,
            "session closed"
        );
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal session transition {} -> {next}",
            self.state
        );
        trace!(from = %self.state, to = %next, "session state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::transport::channel::{self, Peer};
    use assert_matches::assert_matches;
    use bytes::Bytes;
    use pathway_proto::OutboundEvent;
    use pathway_search::AStarEngine;

    fn session() -> Session {
        Session::new(Box::new(AStarEngine::new()))
    }

    fn feed(peer: &Peer, command: Command) {
        peer.inbound.send(Ok(Frame::Data(command.encode()))).unwrap();
    }

    fn received(peer: &mut Peer) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = peer.outbound.try_recv() {
            events.push(OutboundEvent::decode(&frame).unwrap());
        }
        events
    }

    #[test]
    fn starts_handshaking() {
        let s = session();
        assert_eq!(s.state(), SessionState::Handshaking);
        assert_eq!(s.stats(), SessionStats::default());
        assert_eq!(s.pending_writes(), 0);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(session().id(), session().id());
    }

    #[test]
    fn dispatch_queues_without_writing() {
        let mut s = session();
        let outcome = s.dispatch(&Command::AddNode { x: 1.5, y: 2.5 }.encode()).unwrap();
        assert_eq!(outcome, Dispatch::Applied);
        assert_eq!(s.pending_writes(), 1);
        assert_eq!(s.stats().commands_handled, 1);
    }

    #[test]
    fn dispatch_malformed_is_ignored() {
        let mut s = session();
        assert_eq!(
            s.dispatch(&[0xFF, 0x01]).unwrap(),
            Dispatch::Ignored(IgnoreReason::Malformed)
        );
        assert_eq!(s.pending_writes(), 0);
        assert_eq!(s.stats().commands_ignored, 1);
    }

    #[test]
    fn dispatch_empty_payload_is_unset() {
        let mut s = session();
        assert_eq!(
            s.dispatch(&[]).unwrap(),
            Dispatch::Ignored(IgnoreReason::Unset)
        );
    }

    #[tokio::test]
    async fn scenario_events_arrive_in_order() {
        let (mut transport, mut peer) = channel::pair();
        feed(&peer, Command::AddNode { x: 0.0, y: 0.0 });
        feed(&peer, Command::AddNode { x: 10.0, y: 0.0 });
        feed(&peer, Command::AddConnection { id1: 0, id2: 1 });
        feed(&peer, Command::RemoveNode { id: 0 });
        feed(&peer, Command::AddNode { x: 3.0, y: 4.0 });
        peer.inbound.send(Ok(Frame::Close)).unwrap();

        let mut s = session();
        s.run(&mut transport, CancellationToken::new()).await.unwrap();

        assert_eq!(
            received(&mut peer),
            vec![
                OutboundEvent::NodeAdded { id: 0, x: 0.0, y: 0.0 },
                OutboundEvent::NodeAdded { id: 1, x: 10.0, y: 0.0 },
                OutboundEvent::ConnectionAdded { id1: 0, id2: 1 },
                OutboundEvent::NodeRemoved { id: 0 },
                OutboundEvent::NodeAdded { id: 0, x: 3.0, y: 4.0 },
            ]
        );
        assert_eq!(s.state(), SessionState::Closed);
        assert_eq!(s.stats().events_written, 5);
        assert!(transport.closed);
    }

    #[tokio::test]
    async fn malformed_message_does_not_end_session() {
        let (mut transport, mut peer) = channel::pair();
        peer.inbound
            .send(Ok(Frame::Data(Bytes::from_static(&[0xFF, 0xFF, 0xFF]))))
            .unwrap();
        feed(&peer, Command::AddNode { x: 1.0, y: 1.0 });
        peer.inbound.send(Ok(Frame::Close)).unwrap();

        let mut s = session();
        s.run(&mut transport, CancellationToken::new()).await.unwrap();

        assert_eq!(
            received(&mut peer),
            vec![OutboundEvent::NodeAdded { id: 0, x: 1.0, y: 1.0 }]
        );
        assert_eq!(s.stats().commands_ignored, 1);
        assert_eq!(s.stats().commands_handled, 1);
    }

    #[tokio::test]
    async fn control_frames_are_skipped() {
        let (mut transport, mut peer) = channel::pair();
        peer.inbound.send(Ok(Frame::Control)).unwrap();
        feed(&peer, Command::AddNode { x: 0.0, y: 0.0 });
        peer.inbound.send(Ok(Frame::Close)).unwrap();

        let mut s = session();
        s.run(&mut transport, CancellationToken::new()).await.unwrap();
        assert_eq!(received(&mut peer).len(), 1);
        assert_eq!(s.stats().commands_ignored, 0);
    }

    #[tokio::test]
    async fn teardown_releases_engine_nodes() {
        let (mut transport, peer) = channel::pair();
        for x in [0.0, 1.0, 2.0] {
            feed(&peer, Command::AddNode { x, y: 0.0 });
        }
        feed(&peer, Command::AddConnection { id1: 0, id2: 2 });
        peer.inbound.send(Ok(Frame::Close)).unwrap();

        let mut s = session();
        s.run(&mut transport, CancellationToken::new()).await.unwrap();
        assert!(s.graph().registry().is_empty());
        assert!(s.graph().engine().is_empty());
    }

    #[tokio::test]
    async fn read_fault_is_fatal() {
        let (mut transport, peer) = channel::pair();
        feed(&peer, Command::AddNode { x: 0.0, y: 0.0 });
        peer.inbound.send(Err(TransportError::Reset)).unwrap();
        feed(&peer, Command::AddNode { x: 1.0, y: 0.0 });

        let mut s = session();
        let result = s.run(&mut transport, CancellationToken::new()).await;
        assert_matches!(
            result,
            Err(SessionError::Transport {
                stage: SessionState::Reading,
                source: TransportError::Reset,
            })
        );
        assert_eq!(s.stats().commands_handled, 1);
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.graph().engine().is_empty());
    }

    #[tokio::test]
    async fn write_fault_is_fatal_and_discards_queue() {
        let (mut transport, peer) = channel::pair();
        transport.fail_sends = true;
        feed(&peer, Command::AddNode { x: 0.0, y: 0.0 });
        feed(&peer, Command::AddNode { x: 1.0, y: 0.0 });

        let mut s = session();
        let result = s.run(&mut transport, CancellationToken::new()).await;
        assert_matches!(
            result,
            Err(SessionError::Transport {
                stage: SessionState::Writing,
                ..
            })
        );
        assert_eq!(s.pending_writes(), 0);
        assert_eq!(s.stats().events_written, 0);
        assert_eq!(s.stats().commands_handled, 1);
    }

    #[tokio::test]
    async fn shutdown_ends_idle_session() {
        let (mut transport, _peer) = channel::pair();
        let token = CancellationToken::new();
        token.cancel();

        let mut s = session();
        s.run(&mut transport, token).await.unwrap();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(transport.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_client_times_out() {
        let (mut transport, mut peer) = channel::pair();
        feed(&peer, Command::AddNode { x: 0.0, y: 0.0 });

        let mut s = session().with_idle_timeout(Duration::from_secs(30));
        let result = s.run(&mut transport, CancellationToken::new()).await;

        assert_matches!(
            result,
            Err(SessionError::IdleTimeout(idle)) if idle == Duration::from_secs(30)
        );
        assert_eq!(received(&mut peer).len(), 1);
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.graph().engine().is_empty());
        assert!(transport.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_idle_timer() {
        let (mut transport, mut peer) = channel::pair();
        let sender = peer.inbound.clone();
        let feeder = tokio::spawn(async move {
            for x in [0.0, 1.0, 2.0] {
                tokio::time::sleep(Duration::from_secs(20)).await;
                sender
                    .send(Ok(Frame::Data(Command::AddNode { x, y: 0.0 }.encode())))
                    .unwrap();
            }
            sender.send(Ok(Frame::Close)).unwrap();
        });

        let mut s = session().with_idle_timeout(Duration::from_secs(30));
        s.run(&mut transport, CancellationToken::new()).await.unwrap();
        feeder.await.unwrap();
        assert_eq!(received(&mut peer).len(), 3);
    }

    #[tokio::test]
    async fn closed_session_does_not_restart() {
        let (mut transport, peer) = channel::pair();
        peer.inbound.send(Ok(Frame::Close)).unwrap();
        let mut s = session();
        s.run(&mut transport, CancellationToken::new()).await.unwrap();

        feed(&peer, Command::AddNode { x: 0.0, y: 0.0 });
        s.run(&mut transport, CancellationToken::new()).await.unwrap();
        assert_eq!(s.stats().commands_handled, 0);
    }
}

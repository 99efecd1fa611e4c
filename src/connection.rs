//! Per-connection state: phase tracking, channel handles, sessions.
//!
//! One [`Connection`] value exists per live transport connection and is
//! owned by whatever drives that connection's pipeline. Dropping it is
//! teardown; there is no side table to forget an entry in.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::protocol::ProtocolPhase;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identifier for one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cheap, non-owning handle onto the transport channel a packet is
/// crossing. The transport layer owns the real channel; this only
/// carries enough identity for listeners to tell channels apart and
/// address the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHandle {
    connection_id: ConnectionId,
    remote_addr: SocketAddr,
}

impl ChannelHandle {
    pub fn new(connection_id: ConnectionId, remote_addr: SocketAddr) -> Self {
        Self {
            connection_id,
            remote_addr,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Remote socket address of the peer behind this channel.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

/// Player/session identity, attached once authentication completes.
///
/// Absent on every event fired before login finishes; that is an
/// expected state callers must handle, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    username: String,
    player_id: u64,
}

impl SessionHandle {
    pub fn new(username: impl Into<String>, player_id: u64) -> Self {
        Self {
            username: username.into(),
            player_id,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn player_id(&self) -> u64 {
        self.player_id
    }
}

/// Mutable per-connection interception state.
///
/// Tracks which protocol phase the connection is in (packet ids are
/// phase-scoped) and the session handle once one exists. Owned
/// exclusively by the connection's processing threads; never shared
/// across connections.
pub struct Connection {
    id: ConnectionId,
    remote_addr: SocketAddr,
    phase: ProtocolPhase,
    session: Option<Arc<SessionHandle>>,
}

impl Connection {
    /// Creates tracking state for a freshly accepted connection,
    /// starting in the handshaking phase.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::next(),
            remote_addr,
            phase: ProtocolPhase::Handshaking,
            session: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Channel handle for packets crossing this connection.
    pub fn channel(&self) -> ChannelHandle {
        ChannelHandle::new(self.id, self.remote_addr)
    }

    /// The phase this connection is currently in.
    pub fn phase(&self) -> ProtocolPhase {
        self.phase
    }

    /// Moves the connection forward to `next`.
    ///
    /// Phases only ever advance; a transition to the current phase or
    /// an earlier one is a protocol compliance bug in the host, logged
    /// and ignored so the pipeline keeps running. Returns whether the
    /// transition was applied.
    pub fn advance(&mut self, next: ProtocolPhase) -> bool {
        if next <= self.phase {
            tracing::warn!(
                connection = %self.id,
                current = ?self.phase,
                requested = ?next,
                "ignoring backwards phase transition"
            );
            return false;
        }
        tracing::debug!(
            connection = %self.id,
            from = ?self.phase,
            to = ?next,
            "phase advanced"
        );
        self.phase = next;
        true
    }

    /// Attaches the authenticated session. Later events on this
    /// connection will carry the handle.
    pub fn attach_session(&mut self, session: SessionHandle) {
        self.session = Some(Arc::new(session));
    }

    /// The session handle, absent until authentication completes.
    pub fn session(&self) -> Option<&Arc<SessionHandle>> {
        self.session.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        Connection::new("127.0.0.1:25565".parse().unwrap())
    }

    #[test]
    fn starts_handshaking() {
        assert_eq!(conn().phase(), ProtocolPhase::Handshaking);
    }

    #[test]
    fn advance_is_forward_only() {
        let mut c = conn();
        assert!(c.advance(ProtocolPhase::Login));
        assert_eq!(c.phase(), ProtocolPhase::Login);

        // Backwards and same-phase transitions are ignored, not fatal.
        assert!(!c.advance(ProtocolPhase::Handshaking));
        assert!(!c.advance(ProtocolPhase::Login));
        assert_eq!(c.phase(), ProtocolPhase::Login);

        assert!(c.advance(ProtocolPhase::Play));
        assert_eq!(c.phase(), ProtocolPhase::Play);
    }

    #[test]
    fn phase_sequence_is_non_decreasing() {
        let mut c = conn();
        let attempts = [
            ProtocolPhase::Status,
            ProtocolPhase::Handshaking,
            ProtocolPhase::Play,
            ProtocolPhase::Login,
        ];
        let mut observed = vec![c.phase()];
        for phase in attempts {
            c.advance(phase);
            observed.push(c.phase());
        }
        assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn session_absent_until_attached() {
        let mut c = conn();
        assert!(c.session().is_none());
        c.attach_session(SessionHandle::new("steve", 7));
        let session = c.session().unwrap();
        assert_eq!(session.username(), "steve");
        assert_eq!(session.player_id(), 7);
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(conn().id(), conn().id());
    }
}

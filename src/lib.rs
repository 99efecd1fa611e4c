//! Inline packet interception for phased game protocols.
//!
//! `packet-tap` sits in a transport pipeline's send/receive path and
//! turns each raw packet into a typed, cancellable event dispatched
//! synchronously to priority-ordered listeners. The non-vetoed common
//! case adds no latency beyond the listener calls themselves: no
//! queuing, no hand-off, one envelope and one event allocated per
//! packet.
//!
//! The crate does not implement a protocol. It resolves packet
//! identities against host-supplied per-version tables, tracks which
//! phase each connection is in (packet ids are phase-scoped), and
//! returns a disposition the pipeline hook must honor: drop the packet
//! when a listener cancelled, forward the possibly substituted packet
//! otherwise.
//!
//! ```
//! use std::sync::Arc;
//! use packet_tap::{
//!     Cancellable, Connection, FramePacket, ListenerError, ListenerFilter, PacketAccess,
//!     PacketIdentity, PacketListener, PacketTap, Priority, ProtocolPhase, ProtocolRegistry,
//!     SendEvent, protocol::Direction,
//! };
//!
//! const KEEP_ALIVE: PacketIdentity = PacketIdentity::new("ClientboundKeepAlive");
//!
//! struct DropKeepAlive;
//!
//! impl PacketListener for DropKeepAlive {
//!     fn on_send(&self, event: &mut SendEvent) -> Result<(), ListenerError> {
//!         if event.packet_id().known() == Some(0x10) {
//!             event.cancel();
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let registry = ProtocolRegistry::builder(765)
//!     .insert(ProtocolPhase::Play, Direction::Send, KEEP_ALIVE, 0x10)
//!     .unwrap()
//!     .build();
//! let tap = PacketTap::new(registry);
//! tap.listeners()
//!     .register(Arc::new(DropKeepAlive), Priority::Normal, ListenerFilter::any(), "drop-keepalive");
//!
//! let mut conn = Connection::new("127.0.0.1:25565".parse().unwrap());
//! conn.advance(ProtocolPhase::Play);
//!
//! let packet = Box::new(FramePacket::new(KEEP_ALIVE, vec![0u8; 8]));
//! let disposition = tap.on_send(&conn, conn.channel(), packet);
//! assert!(!disposition.proceed);
//! ```

pub mod connection;
pub mod dispatch;
pub mod event;
pub mod intercept;
pub mod protocol;

pub use connection::{ChannelHandle, Connection, ConnectionId, SessionHandle};
pub use dispatch::{
    ListenerError, ListenerFilter, ListenerId, ListenerRegistry, PacketListener, Priority,
};
pub use event::{
    Cancellable, FramePacket, PacketAccess, PacketEnvelope, RawPacket, ReceiveEvent, SendEvent,
    SessionScoped,
};
pub use intercept::{PacketTap, ReceiveDisposition, SendDisposition};
pub use protocol::{PacketIdentity, PacketTypeId, ProtocolPhase, ProtocolRegistry};

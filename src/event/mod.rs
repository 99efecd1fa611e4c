//! Cancellable packet events and their capability traits.
//!
//! Events are a flat set of concrete structs, not a hierarchy: one per
//! direction, each implementing the small capability traits listeners
//! program against ([`PacketAccess`], [`Cancellable`], [`SessionScoped`]).
//! The dispatcher constructs an event per intercepted packet, hands
//! listeners `&mut` access, and consumes the event into a disposition;
//! a finished event cannot re-enter dispatch.

pub mod envelope;

use std::sync::Arc;

use crate::connection::SessionHandle;
use crate::protocol::{Direction, PacketTypeId, ProtocolPhase, ProtocolRegistry};

pub use envelope::{FramePacket, PacketEnvelope, RawPacket};

/// Read and mutate the packet an event wraps.
pub trait PacketAccess {
    fn envelope(&self) -> &PacketEnvelope;

    fn envelope_mut(&mut self) -> &mut PacketEnvelope;

    /// Phase the connection was in when the packet was intercepted.
    fn phase(&self) -> ProtocolPhase;

    fn direction(&self) -> Direction;

    /// Protocol type id of the wrapped packet.
    ///
    /// Resolved on demand against the registry, so a packet substituted
    /// mid-dispatch reports its own id, not the original's. Unregistered
    /// identities yield [`PacketTypeId::UNKNOWN`].
    fn packet_id(&self) -> PacketTypeId;

    /// Interned name of the wrapped packet's type.
    fn packet_name(&self) -> &'static str {
        self.envelope().identity().name()
    }
}

/// Veto participation. The dispatcher aggregates flags across listeners
/// with cancel-wins semantics; see the dispatch module.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn set_cancelled(&mut self, cancelled: bool);

    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}

/// Access to the player/session behind the connection.
pub trait SessionScoped {
    /// The session handle, absent on packets intercepted before
    /// authentication completed (handshake, status, most of login).
    fn session(&self) -> Option<&SessionHandle>;
}

/// Shared state behind both event kinds.
struct EventBody {
    envelope: PacketEnvelope,
    phase: ProtocolPhase,
    registry: Arc<ProtocolRegistry>,
    session: Option<Arc<SessionHandle>>,
    cancelled: bool,
}

impl EventBody {
    fn packet_id(&self, direction: Direction) -> PacketTypeId {
        self.registry
            .resolve(self.phase, direction, self.envelope.identity())
    }
}

macro_rules! define_packet_event {
    ($(#[$doc:meta])* $name:ident, $direction:expr) => {
        $(#[$doc])*
        pub struct $name {
            body: EventBody,
        }

        impl $name {
            pub(crate) fn new(
                envelope: PacketEnvelope,
                phase: ProtocolPhase,
                registry: Arc<ProtocolRegistry>,
                session: Option<Arc<SessionHandle>>,
            ) -> Self {
                Self {
                    body: EventBody {
                        envelope,
                        phase,
                        registry,
                        session,
                        cancelled: false,
                    },
                }
            }

            pub(crate) fn into_envelope(self) -> PacketEnvelope {
                self.body.envelope
            }
        }

        impl PacketAccess for $name {
            fn envelope(&self) -> &PacketEnvelope {
                &self.body.envelope
            }

            fn envelope_mut(&mut self) -> &mut PacketEnvelope {
                &mut self.body.envelope
            }

            fn phase(&self) -> ProtocolPhase {
                self.body.phase
            }

            fn direction(&self) -> Direction {
                $direction
            }

            fn packet_id(&self) -> PacketTypeId {
                self.body.packet_id($direction)
            }
        }

        impl Cancellable for $name {
            fn is_cancelled(&self) -> bool {
                self.body.cancelled
            }

            fn set_cancelled(&mut self, cancelled: bool) {
                self.body.cancelled = cancelled;
            }
        }

        impl SessionScoped for $name {
            fn session(&self) -> Option<&SessionHandle> {
                self.body.session.as_deref()
            }
        }
    };
}

define_packet_event!(
    /// Fired for every outbound packet before it reaches the transport
    /// encoder. Cancelling keeps the packet off the wire entirely; the
    /// peer never sees it.
    SendEvent,
    Direction::Send
);

define_packet_event!(
    /// Fired for every inbound packet after decoding, before the host's
    /// handling logic runs. Cancelling hides the packet from the host,
    /// though its bytes were already read off the socket.
    ReceiveEvent,
    Direction::Receive
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::protocol::PacketIdentity;

    const KEEP_ALIVE: PacketIdentity = PacketIdentity::new("ClientboundKeepAlive");
    const CHAT: PacketIdentity = PacketIdentity::new("ClientboundChatMessage");

    fn registry() -> Arc<ProtocolRegistry> {
        Arc::new(
            ProtocolRegistry::builder(765)
                .insert(ProtocolPhase::Play, Direction::Send, KEEP_ALIVE, 0x10)
                .unwrap()
                .insert(ProtocolPhase::Play, Direction::Send, CHAT, 0x11)
                .unwrap()
                .build(),
        )
    }

    fn play_send_event(identity: PacketIdentity) -> SendEvent {
        let conn = Connection::new("127.0.0.1:25565".parse().unwrap());
        let envelope = PacketEnvelope::new(
            conn.channel(),
            Box::new(FramePacket::new(identity, vec![0u8; 4])),
        );
        SendEvent::new(envelope, ProtocolPhase::Play, registry(), None)
    }

    #[test]
    fn packet_id_resolves_through_registry() {
        let ev = play_send_event(KEEP_ALIVE);
        assert_eq!(ev.packet_id(), PacketTypeId(0x10));
        assert_eq!(ev.packet_name(), "ClientboundKeepAlive");
        assert_eq!(ev.direction(), Direction::Send);
    }

    #[test]
    fn packet_id_is_lazy_across_substitution() {
        let mut ev = play_send_event(KEEP_ALIVE);
        assert_eq!(ev.packet_id(), PacketTypeId(0x10));
        ev.envelope_mut()
            .replace_packet(Box::new(FramePacket::new(CHAT, vec![])));
        assert_eq!(ev.packet_id(), PacketTypeId(0x11));
    }

    #[test]
    fn unregistered_identity_yields_unknown() {
        let ev = play_send_event(PacketIdentity::new("ModdedMysteryPacket"));
        assert!(ev.packet_id().is_unknown());
    }

    #[test]
    fn session_absent_before_login_completes() {
        let ev = play_send_event(KEEP_ALIVE);
        assert!(ev.session().is_none());
    }

    #[test]
    fn cancel_flag_defaults_false() {
        let mut ev = play_send_event(KEEP_ALIVE);
        assert!(!ev.is_cancelled());
        ev.cancel();
        assert!(ev.is_cancelled());
    }
}

//! Pipeline-facing entry points.
//!
//! The transport hook calls [`PacketTap::on_send`] for every outbound
//! packet before encoding and [`PacketTap::on_receive`] for every
//! inbound packet after decoding, inline on whichever thread owns the
//! packet. Both return a [disposition](SendDisposition) the hook must
//! honor: drop the packet when `proceed` is false, and forward the
//! returned packet (which a listener may have substituted) otherwise.

use std::sync::Arc;

use crate::connection::{ChannelHandle, Connection};
use crate::dispatch::{ListenerRegistry, dispatch_receive, dispatch_send};
use crate::event::envelope::{PacketEnvelope, RawPacket};
use crate::event::{ReceiveEvent, SendEvent};
use crate::protocol::ProtocolRegistry;

/// Post-dispatch decision for one outbound packet.
pub struct SendDisposition {
    /// Whether the hook should forward the packet to the encoder.
    pub proceed: bool,
    /// The packet to forward; not necessarily the one handed in, since
    /// a listener may have substituted it.
    pub packet: Box<dyn RawPacket>,
}

/// Post-dispatch decision for one inbound packet.
pub struct ReceiveDisposition {
    /// Whether the hook should let the host's handling logic see the packet.
    pub proceed: bool,
    /// The packet to hand on, possibly substituted by a listener.
    pub packet: Box<dyn RawPacket>,
}

/// The interception core: one protocol registry plus one listener set,
/// shared across every connection of a process.
///
/// Dispatch is synchronous and connection-scoped; per packet it
/// allocates one envelope and one event, runs the matching listeners
/// on the calling thread, and returns. Nothing here blocks or queues.
pub struct PacketTap {
    registry: Arc<ProtocolRegistry>,
    listeners: ListenerRegistry,
}

impl PacketTap {
    pub fn new(registry: ProtocolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ProtocolRegistry> {
        &self.registry
    }

    /// Listener registration surface.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Intercepts one outbound packet before it reaches the transport.
    pub fn on_send(
        &self,
        connection: &Connection,
        channel: ChannelHandle,
        packet: Box<dyn RawPacket>,
    ) -> SendDisposition {
        let snapshot = self.listeners.snapshot();
        let mut event = SendEvent::new(
            PacketEnvelope::new(channel, packet),
            connection.phase(),
            Arc::clone(&self.registry),
            connection.session().cloned(),
        );
        let cancelled = dispatch_send(&snapshot, &mut event);
        SendDisposition {
            proceed: !cancelled,
            packet: event.into_envelope().into_packet(),
        }
    }

    /// Intercepts one inbound packet after decoding.
    pub fn on_receive(
        &self,
        connection: &Connection,
        channel: ChannelHandle,
        packet: Box<dyn RawPacket>,
    ) -> ReceiveDisposition {
        let snapshot = self.listeners.snapshot();
        let mut event = ReceiveEvent::new(
            PacketEnvelope::new(channel, packet),
            connection.phase(),
            Arc::clone(&self.registry),
            connection.session().cloned(),
        );
        let cancelled = dispatch_receive(&snapshot, &mut event);
        ReceiveDisposition {
            proceed: !cancelled,
            packet: event.into_envelope().into_packet(),
        }
    }
}

use std::any::Any;
use std::fmt;

use bytes::Bytes;

use crate::connection::ChannelHandle;
use crate::protocol::PacketIdentity;

/// Host-side packet object crossing the pipeline.
///
/// The core never looks inside packet bodies; all it needs is a stable
/// identity for registry lookup, plus `Any` access so listeners that do
/// know the concrete type can downcast and mutate it.
pub trait RawPacket: Send + 'static {
    /// Stable type tag for this packet, as registered with the
    /// protocol registry.
    fn identity(&self) -> PacketIdentity;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn RawPacket {
    /// Downcasts to a concrete packet type.
    pub fn downcast_ref<T: RawPacket>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts to a concrete packet type, mutably.
    pub fn downcast_mut<T: RawPacket>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn RawPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPacket({})", self.identity())
    }
}

/// [`RawPacket`] for hosts that intercept at the encoded-frame level:
/// an identity plus the already-encoded body bytes.
#[derive(Debug, Clone)]
pub struct FramePacket {
    identity: PacketIdentity,
    body: Bytes,
}

impl FramePacket {
    pub fn new(identity: PacketIdentity, body: impl Into<Bytes>) -> Self {
        Self {
            identity,
            body: body.into(),
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

impl RawPacket for FramePacket {
    fn identity(&self) -> PacketIdentity {
        self.identity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Pairs one raw packet with the channel it is crossing, for the
/// duration of a single dispatch.
///
/// Created fresh per intercepted packet and consumed into the
/// disposition when dispatch returns; envelopes are never cached or
/// reused across packets.
pub struct PacketEnvelope {
    channel: ChannelHandle,
    packet: Box<dyn RawPacket>,
}

impl PacketEnvelope {
    pub fn new(channel: ChannelHandle, packet: Box<dyn RawPacket>) -> Self {
        Self { channel, packet }
    }

    pub fn channel(&self) -> ChannelHandle {
        self.channel
    }

    /// Identity of the packet currently held. May change mid-dispatch
    /// if a listener substitutes the packet.
    pub fn identity(&self) -> PacketIdentity {
        self.packet.identity()
    }

    pub fn packet(&self) -> &dyn RawPacket {
        self.packet.as_ref()
    }

    pub fn packet_mut(&mut self) -> &mut dyn RawPacket {
        self.packet.as_mut()
    }

    /// Swaps in a different packet, returning the old one.
    ///
    /// The substitution is what the pipeline hook receives after
    /// dispatch, so a listener can alter what is ultimately sent
    /// without the dispatcher knowing packet internals.
    pub fn replace_packet(&mut self, packet: Box<dyn RawPacket>) -> Box<dyn RawPacket> {
        std::mem::replace(&mut self.packet, packet)
    }

    /// Tears the envelope down into the packet it carried.
    pub fn into_packet(self) -> Box<dyn RawPacket> {
        self.packet
    }
}

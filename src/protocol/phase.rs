use bitflags::bitflags;

/// Stage of the connection's protocol handshake sequence.
///
/// Every connection is in exactly one phase at any instant, and phases
/// only ever move forward in declaration order. Each phase has its own
/// packet id space per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProtocolPhase {
    Handshaking,
    Status,
    Login,
    Play,
}

impl ProtocolPhase {
    /// Filter mask bit corresponding to this phase.
    pub const fn mask(self) -> PhaseMask {
        match self {
            ProtocolPhase::Handshaking => PhaseMask::HANDSHAKING,
            ProtocolPhase::Status => PhaseMask::STATUS,
            ProtocolPhase::Login => PhaseMask::LOGIN,
            ProtocolPhase::Play => PhaseMask::PLAY,
        }
    }
}

/// Which way a packet is travelling relative to the transport layer.
///
/// `Send` events fire before the packet is encoded, so cancelling one
/// keeps the packet off the wire entirely. `Receive` events fire after
/// decoding; the bytes were already read, cancelling only hides the
/// packet from the host's handling logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Send,
    Receive,
}

impl Direction {
    /// Filter mask bit corresponding to this direction.
    pub const fn mask(self) -> DirectionMask {
        match self {
            Direction::Send => DirectionMask::SEND,
            Direction::Receive => DirectionMask::RECEIVE,
        }
    }
}

bitflags! {
    /// Set of protocol phases a listener is interested in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct PhaseMask: u8 {
        const HANDSHAKING = 0b0001;
        const STATUS      = 0b0010;
        const LOGIN       = 0b0100;
        const PLAY        = 0b1000;
    }
}

bitflags! {
    /// Set of packet directions a listener is interested in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct DirectionMask: u8 {
        const SEND    = 0b01;
        const RECEIVE = 0b10;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_order_forward() {
        assert!(ProtocolPhase::Handshaking < ProtocolPhase::Status);
        assert!(ProtocolPhase::Status < ProtocolPhase::Login);
        assert!(ProtocolPhase::Login < ProtocolPhase::Play);
    }

    #[test]
    fn masks_are_disjoint() {
        let phases = [
            ProtocolPhase::Handshaking,
            ProtocolPhase::Status,
            ProtocolPhase::Login,
            ProtocolPhase::Play,
        ];
        let mut seen = PhaseMask::empty();
        for phase in phases {
            assert!(!seen.intersects(phase.mask()));
            seen |= phase.mask();
        }
        assert_eq!(seen, PhaseMask::all());
    }
}

use std::fmt;

use thiserror::Error;

use crate::event::{ReceiveEvent, SendEvent};
use crate::protocol::{Direction, DirectionMask, PhaseMask, ProtocolPhase};

/// Ordering bucket for listener invocation.
///
/// `Lowest` runs first, `Highest` last among tiers that can affect the
/// outcome. `Monitor` runs after everything else and exists purely to
/// observe the final state; its writes to the cancel flag are discarded
/// by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
    Monitor,
}

/// Phase/direction subset a listener wants events for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerFilter {
    phases: PhaseMask,
    directions: DirectionMask,
}

impl ListenerFilter {
    /// Matches every event.
    pub const fn any() -> Self {
        Self {
            phases: PhaseMask::all(),
            directions: DirectionMask::all(),
        }
    }

    /// Restricts to the given phases.
    pub const fn phases(mut self, phases: PhaseMask) -> Self {
        self.phases = phases;
        self
    }

    /// Restricts to the given directions.
    pub const fn directions(mut self, directions: DirectionMask) -> Self {
        self.directions = directions;
        self
    }

    pub fn matches(&self, phase: ProtocolPhase, direction: Direction) -> bool {
        self.phases.contains(phase.mask()) && self.directions.contains(direction.mask())
    }
}

impl Default for ListenerFilter {
    fn default() -> Self {
        Self::any()
    }
}

/// Failure raised by a listener callback.
///
/// Dispatch treats it as that listener's problem alone: the error is
/// logged with the listener's registered name and the chain continues.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ListenerError(Box<dyn std::error::Error + Send + Sync>);

impl ListenerError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Callbacks invoked per intercepted packet, on the transport thread
/// that owns the packet.
///
/// Implementations override the directions they care about; both
/// default to doing nothing. Callbacks may read the packet id, read or
/// replace the packet, flip the cancel flag, and read the (possibly
/// absent) session handle.
pub trait PacketListener: Send + Sync {
    /// Called for outbound packets before they reach the transport.
    fn on_send(&self, _event: &mut SendEvent) -> Result<(), ListenerError> {
        Ok(())
    }

    /// Called for inbound packets after decoding.
    fn on_receive(&self, _event: &mut ReceiveEvent) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Ticket returned by registration; passing it back unregisters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_tiers_order() {
        assert!(Priority::Lowest < Priority::Low);
        assert!(Priority::Highest < Priority::Monitor);
    }

    #[test]
    fn filter_defaults_to_everything() {
        let f = ListenerFilter::any();
        assert!(f.matches(ProtocolPhase::Handshaking, Direction::Send));
        assert!(f.matches(ProtocolPhase::Play, Direction::Receive));
    }

    #[test]
    fn filter_restricts_phase_and_direction() {
        let f = ListenerFilter::any()
            .phases(PhaseMask::PLAY)
            .directions(DirectionMask::SEND);
        assert!(f.matches(ProtocolPhase::Play, Direction::Send));
        assert!(!f.matches(ProtocolPhase::Play, Direction::Receive));
        assert!(!f.matches(ProtocolPhase::Login, Direction::Send));
    }
}

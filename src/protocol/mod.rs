//! Protocol phases, directions, and the packet identity registry.
//!
//! This module houses the static side of interception: the phase and
//! direction enums that scope packet ids, and the immutable registry
//! mapping packet identities to their protocol-defined type ids.

pub mod phase;
pub mod registry;

pub use phase::{Direction, DirectionMask, PhaseMask, ProtocolPhase};
pub use registry::{PacketIdentity, PacketTypeId, ProtocolRegistry, RegistryBuilder, RegistryError};

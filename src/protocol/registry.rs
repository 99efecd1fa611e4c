use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::protocol::phase::{Direction, ProtocolPhase};

/// Stable type tag naming a concrete packet class.
///
/// Identities are interned static strings supplied by the host when it
/// builds the registry tables, so resolving a packet never touches
/// runtime reflection. Two packets are the same kind iff their
/// identities compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketIdentity(&'static str);

impl PacketIdentity {
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    /// The interned tag, e.g. `"ClientboundKeepAlive"`.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for PacketIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Display for PacketIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Protocol-defined packet type id, unique only within one
/// `(phase, direction)` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketTypeId(pub i32);

impl PacketTypeId {
    /// Sentinel for a packet whose identity has no registered mapping.
    ///
    /// Consumers must treat this as "no id-based filtering possible",
    /// never as a valid id.
    pub const UNKNOWN: PacketTypeId = PacketTypeId(-1);

    pub const fn is_unknown(self) -> bool {
        self.0 < 0
    }

    /// The raw id, or `None` for the unknown sentinel.
    pub const fn known(self) -> Option<i32> {
        if self.0 < 0 { None } else { Some(self.0) }
    }
}

/// Errors raised while building a registry from host-supplied tables.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The same identity was inserted twice within one (phase, direction) scope.
    #[error("identity {identity} already registered for {phase:?}/{direction:?}")]
    DuplicateIdentity {
        phase: ProtocolPhase,
        direction: Direction,
        identity: PacketIdentity,
    },

    /// The same id was given to two identities within one (phase, direction) scope.
    #[error("id {id:?} already taken by {taken_by} in {phase:?}/{direction:?}")]
    DuplicateId {
        phase: ProtocolPhase,
        direction: Direction,
        id: PacketTypeId,
        taken_by: PacketIdentity,
    },

    /// A negative id collides with the unknown sentinel's value space.
    #[error("id {0} is negative; negative ids are reserved for the unknown sentinel")]
    ReservedId(i32),
}

type ScopeKey = (ProtocolPhase, Direction);

/// Immutable identity-to-id tables for one protocol version.
///
/// Built once at startup via [`RegistryBuilder`] and shared by `Arc`
/// across connection threads; lookups are pure reads over the frozen
/// maps, so no locking is involved.
#[derive(Debug)]
pub struct ProtocolRegistry {
    version: i32,
    ids: HashMap<(ScopeKey, PacketIdentity), PacketTypeId>,
    identities: HashMap<(ScopeKey, PacketTypeId), PacketIdentity>,
}

impl ProtocolRegistry {
    /// Starts a builder for the given protocol version number.
    pub fn builder(version: i32) -> RegistryBuilder {
        RegistryBuilder {
            version,
            ids: HashMap::new(),
            identities: HashMap::new(),
        }
    }

    /// Protocol version these tables were built for.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Resolves a packet identity to its protocol id within one scope.
    ///
    /// An unregistered identity resolves to [`PacketTypeId::UNKNOWN`]
    /// rather than failing; new or modded packet classes simply carry
    /// no id and pass through unfiltered.
    pub fn resolve(
        &self,
        phase: ProtocolPhase,
        direction: Direction,
        identity: PacketIdentity,
    ) -> PacketTypeId {
        self.ids
            .get(&((phase, direction), identity))
            .copied()
            .unwrap_or(PacketTypeId::UNKNOWN)
    }

    /// Reverse lookup: the identity registered under an id, if any.
    pub fn identity_of(
        &self,
        phase: ProtocolPhase,
        direction: Direction,
        id: PacketTypeId,
    ) -> Option<PacketIdentity> {
        self.identities.get(&((phase, direction), id)).copied()
    }

    /// Number of registered mappings across all scopes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Startup-time accumulator for [`ProtocolRegistry`] tables.
///
/// The host feeds this from its per-version packet tables; the core
/// never hardcodes protocol versions itself.
#[derive(Debug)]
pub struct RegistryBuilder {
    version: i32,
    ids: HashMap<(ScopeKey, PacketIdentity), PacketTypeId>,
    identities: HashMap<(ScopeKey, PacketTypeId), PacketIdentity>,
}

impl RegistryBuilder {
    /// Registers one identity-to-id mapping within a (phase, direction) scope.
    pub fn insert(
        mut self,
        phase: ProtocolPhase,
        direction: Direction,
        identity: PacketIdentity,
        id: i32,
    ) -> Result<Self, RegistryError> {
        if id < 0 {
            return Err(RegistryError::ReservedId(id));
        }
        let id = PacketTypeId(id);
        let scope = (phase, direction);

        if self.ids.contains_key(&(scope, identity)) {
            return Err(RegistryError::DuplicateIdentity {
                phase,
                direction,
                identity,
            });
        }
        if let Some(&taken_by) = self.identities.get(&(scope, id)) {
            return Err(RegistryError::DuplicateId {
                phase,
                direction,
                id,
                taken_by,
            });
        }

        self.ids.insert((scope, identity), id);
        self.identities.insert((scope, id), identity);
        Ok(self)
    }

    /// Freezes the tables into an immutable registry.
    pub fn build(self) -> ProtocolRegistry {
        tracing::debug!(
            version = self.version,
            mappings = self.ids.len(),
            "protocol registry built"
        );
        ProtocolRegistry {
            version: self.version,
            ids: self.ids,
            identities: self.identities,
        }
    }
}

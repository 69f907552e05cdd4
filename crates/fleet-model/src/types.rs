use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entity kinds and ids
// ---------------------------------------------------------------------------

/// The three entity kinds the reconciliation worker knows how to drive.
///
/// The real backend has many more kinds; raw kind strings arriving over
/// the wire go through [`EntityKind::parse`], and anything unknown is
/// rejected at that boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Machine,
    Unit,
    Action,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Machine => "machine",
            EntityKind::Unit => "unit",
            EntityKind::Action => "action",
        }
    }

    /// Map a wire-level kind string back to a known kind.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "machine" => Some(EntityKind::Machine),
            "unit" => Some(EntityKind::Unit),
            "action" => Some(EntityKind::Action),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle to one entity, resolved on demand against the backing
/// store. The store is the sole owner of entity storage.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityId {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn machine(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Machine, id)
    }

    pub fn unit(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Unit, id)
    }

    pub fn action(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Action, id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// Deltas
// ---------------------------------------------------------------------------

/// One change notification for a single entity. The change feed yields
/// ordered batches (`Vec<Delta>`); within a batch order is significant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub entity: EntityId,
    pub removed: bool,
}

impl Delta {
    pub fn changed(entity: EntityId) -> Self {
        Self {
            entity,
            removed: false,
        }
    }

    pub fn removed(entity: EntityId) -> Self {
        Self {
            entity,
            removed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_through_str() {
        for kind in [EntityKind::Machine, EntityKind::Unit, EntityKind::Action] {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn unknown_kind_parses_to_none() {
        assert_eq!(EntityKind::parse("application"), None);
        assert_eq!(EntityKind::parse(""), None);
    }

    #[test]
    fn entity_id_displays_as_normalized_key() {
        assert_eq!(EntityId::unit("wordpress-0").to_string(), "unit-wordpress-0");
        assert_eq!(EntityId::machine("0").to_string(), "machine-0");
    }
}

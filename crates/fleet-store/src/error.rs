use fleet_model::EntityId;

/// All errors the store can return from its capability surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced entity does not exist (never created, or removed).
    NotFound { entity: EntityId },
    /// A bounded `wait_agent_presence` elapsed before presence was marked.
    PresenceTimeout { entity: EntityId },
    /// A unit was assigned to a machine that does not exist.
    UnknownMachine { unit: String, machine: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity } => write!(f, "entity {entity} not found"),
            Self::PresenceTimeout { entity } => {
                write!(f, "timed out waiting for agent presence of {entity}")
            }
            Self::UnknownMachine { unit, machine } => {
                write!(f, "cannot assign unit {unit} to unknown machine {machine}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

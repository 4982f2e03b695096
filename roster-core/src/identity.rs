//! Identity types for ROSTER entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour of the strongly-typed entity identifiers.
///
/// Every identifier wraps a UUIDv7, so ids sort by creation time.
pub trait EntityIdType: Copy + Eq + Hash + Ord + fmt::Display + fmt::Debug {
    /// Entity name used in error messages.
    const ENTITY_NAME: &'static str;

    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;

    /// Access the underlying UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a fresh timestamp-sortable identifier.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a fresh UUIDv7 identifier.
            pub fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a user account in the directory (agent, supervisor or admin).
    AgentId,
    "Agent"
);

define_entity_id!(
    /// Identifier of a single (agent, date) shift record.
    ShiftId,
    "ShiftRecord"
);

define_entity_id!(
    /// Identifier of a swap request.
    SwapId,
    "SwapRequest"
);

define_entity_id!(
    /// Identifier of an audit log entry.
    AuditEntryId,
    "AuditEntry"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_roundtrip_through_strings() {
        let id = SwapId::now_v7();
        let parsed: SwapId = id.to_string().parse().expect("valid uuid");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_ids_are_time_sortable() {
        let first = AgentId::now_v7();
        let second = AgentId::now_v7();
        assert!(first < second);
    }

    #[test]
    fn test_id_serializes_as_bare_uuid() {
        let uuid = Uuid::now_v7();
        let id = ShiftId::new(uuid);
        let json = serde_json::to_string(&id).expect("serializable");
        assert_eq!(json, format!("\"{}\"", uuid));
    }

    #[test]
    fn test_entity_names() {
        assert_eq!(AgentId::ENTITY_NAME, "Agent");
        assert_eq!(SwapId::ENTITY_NAME, "SwapRequest");
        assert_eq!(<ShiftId as EntityIdType>::as_uuid(&ShiftId::new(Uuid::nil())), Uuid::nil());
    }
}

//! Typed IDs for type-safe entity references.
//!
//! A `TrainerId` cannot be passed where a `SchoolId` is expected, even though
//! both are UUIDs in the database.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new time-ordered ID (UUID v7).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(SchoolId, "Unique identifier for a partner school.");
typed_id!(ModuleId, "Unique identifier for a catalog module.");
typed_id!(TrainerId, "Unique identifier for a trainer profile.");
typed_id!(SessionId, "Unique identifier for a training session.");
typed_id!(AvailabilityId, "Unique identifier for an availability window.");
typed_id!(EventId, "Unique identifier for a session event log entry.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_ids_are_time_ordered() {
        let first = SessionId::new();
        let second = SessionId::new();
        assert!(first <= second);
    }

    #[test]
    fn test_uuid_conversions() {
        let uuid = Uuid::new_v4();
        let id = SchoolId::from(uuid);
        assert_eq!(id.into_inner(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn test_display_and_parse() {
        let id = TrainerId::new();
        let parsed = TrainerId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(ModuleId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&AvailabilityId::from(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}

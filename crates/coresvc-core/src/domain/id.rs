//! Opaque, time-ordered entity identifier.
//!
//! Wraps a UUID v7 so identifiers sort roughly by creation time without the
//! domain layer ever touching the binary UUID form directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier carrying a time-ordered UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(Uuid);

impl Id {
    /// Generate a new identifier for a resource created right now.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID (used when re-hydrating from storage).
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID, for infrastructure boundaries only.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_round_trips_through_string() {
        let id = Id::generate();
        let parsed: Id = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn generated_ids_are_time_ordered() {
        let a = Id::generate();
        let b = Id::generate();
        assert!(a.as_uuid().get_version_num() == 7);
        assert!(a.as_uuid() <= b.as_uuid());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("not-a-uuid".parse::<Id>().is_err());
    }
}

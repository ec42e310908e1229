//! Opaque 128-bit identifiers, rendered as lowercase hex (no dashes) on the wire.
//!
//! `GameStateId` is the sole idempotency token linking a game snapshot to
//! its scheduled timeout task (see `domain::rules::try_to_lose_by_time`).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

macro_rules! hex_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Lowercase, no-dash hex rendering (spec §3: "rendered as lowercase hex").
            pub fn hex(&self) -> String {
                self.0.simple().to_string()
            }

            pub fn from_hex(s: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(GameId);
hex_id!(GameStateId);
hex_id!(UserId);
hex_id!(LobbyId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_rendering_has_no_dashes() {
        let id = GameId::new();
        let hex = id.hex();
        assert_eq!(hex.len(), 32);
        assert!(!hex.contains('-'));
    }

    #[test]
    fn round_trips_through_hex() {
        let id = UserId::new();
        let parsed = UserId::from_hex(&id.hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn json_round_trip() {
        let id = GameStateId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: GameStateId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

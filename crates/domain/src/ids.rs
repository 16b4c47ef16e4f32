//! Strongly-typed identifiers for domain entities
//!
//! The persistence gateway keys users, rooms, and templates by integer rowids,
//! so these wrap `i64` rather than UUIDs. Connection handles are transport
//! state and live in the engine, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed ID wrapper around an integer rowid
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(RoomId);
define_id!(TemplateId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_transparently() {
        let id = RoomId::new(7);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "7");

        let back: RoomId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}

//! Strongly-typed ID wrappers for all entity types
//!
//! Newtype wrappers prevent mixing up IDs from different entity types at
//! compile time. IDs are client-generated UUIDs assigned at construction,
//! so two distinct instances are never accidentally equal: there is no
//! "not yet persisted" identity state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an ID from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(UserId, "usr-");
define_id!(ContactId, "ctc-");
define_id!(CardId, "card-");
define_id!(InvoiceId, "inv-");
define_id!(ItemId, "item-");
define_id!(ShareId, "shr-");
define_id!(CategoryId, "cat-");
define_id!(RuleId, "rule-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = InvoiceId::new();
        assert!(!id.as_uuid().is_nil());
    }

    #[test]
    fn test_id_display_prefix() {
        let id = CardId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("card-"));
        assert_eq!(display.len(), 13); // "card-" + 8 chars
    }

    #[test]
    fn test_distinct_instances_never_equal() {
        // Two freshly constructed entities must never compare equal,
        // even before any persistence happens.
        let a = ShareId::new();
        let b = ShareId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_id_round_trip() {
        let id = RuleId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: RuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_from_str_with_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: CategoryId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
    }
}

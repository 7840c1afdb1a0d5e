//! Typed IDs for type-safe entity references.
//!
//! Document-store IDs are opaque strings. Wrapping them in typed newtypes
//! prevents accidentally passing a `PhaseId` where a `ProjectId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers over store document IDs.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Mints a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Returns the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(CustomerId, "Unique identifier for a customer workspace.");
typed_id!(ProjectId, "Unique identifier for a project.");
typed_id!(PhaseId, "Unique identifier for a project phase.");
typed_id!(DepartmentId, "Unique identifier for a phase department.");
typed_id!(ExpenseId, "Unique identifier for an expense.");
typed_id!(RequestId, "Unique identifier for a phase extension request.");
typed_id!(ChangeId, "Unique identifier for a phase change-log entry.");
typed_id!(UserId, "Unique identifier for a user.");

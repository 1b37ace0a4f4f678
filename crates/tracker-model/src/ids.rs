#![deny(unsafe_code)]

//! Strongly typed identifiers for remote tracker objects.
//!
//! All identifiers are opaque, trimmed, non-empty strings. They serialize as
//! plain JSON strings so they can be placed directly into request payloads.

use std::fmt;

use crate::ModelError;

macro_rules! tracker_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::EmptyIdentifier { kind: $kind });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

tracker_id!(
    /// Identifier of a tracked entity attribute.
    AttributeId,
    "attribute"
);
tracker_id!(
    /// Identifier of a data element recorded on events.
    DataElementId,
    "data element"
);
tracker_id!(ProgramId, "program");
tracker_id!(StageId, "program stage");
tracker_id!(
    /// Identifier of the tracked entity type new instances are registered as.
    TrackedEntityId,
    "tracked entity"
);
tracker_id!(
    /// Reference to a tracked entity instance held by the remote system.
    ///
    /// Obtained from a create response or a lookup by unique attribute and
    /// threaded unchanged through the remaining pipeline stages.
    EntityReference,
    "tracked entity instance"
);

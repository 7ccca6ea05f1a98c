//! Strongly-typed identifiers for remote store records.
//!
//! Job and task identifiers are minted by the store and treated as opaque
//! strings locally; parsing only rejects empty input.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Identifier of a job in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

/// Identifier of a task in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

macro_rules! impl_opaque_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a store-provided identifier. The store is authoritative,
            /// so no shape validation is applied here; use `FromStr` for
            /// user-supplied input.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = ControlError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ControlError::validation(concat!($name, " must not be empty")));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_opaque_id!(JobId, "JobId");
impl_opaque_id!(TaskId, "TaskId");

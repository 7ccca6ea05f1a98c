//! Explicit session context.

use serde::{Deserialize, Serialize};

/// Bearer credential obtained at login.
///
/// Passed explicitly to whatever needs it and dropped at logout; there is
/// deliberately no ambient/global session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

//! Reminder identifier for tracking reminder records

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique reminder identifier
///
/// Identifiers are assigned by the store on creation and travel as plain
/// integers on the wire (webhook bodies carry `reminderId` as a number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(i64);

impl ReminderId {
    /// Wrap a raw store-assigned identifier
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying integer value
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Parse a reminder ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid integer.
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        Ok(Self(s.parse()?))
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ReminderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ReminderId> for i64 {
    fn from(id: ReminderId) -> Self {
        id.0
    }
}

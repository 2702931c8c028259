//! Contact value object - a notification recipient on a reminder

use serde::{Deserialize, Serialize};

/// Delivery channel for a contact
///
/// Only email has a dispatch implementation today; the other modes are
/// accepted at creation and skipped by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMode {
    /// Deliver via email
    Email,
    /// Deliver via SMS (reserved)
    Sms,
    /// Deliver via push notification (reserved)
    Push,
    /// Deliver via iCal invite (reserved)
    Ical,
}

impl ContactMode {
    /// Get the wire/storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
            Self::Ical => "ical",
        }
    }

    /// Whether this mode currently has a dispatch implementation
    #[must_use]
    pub const fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Email)
    }
}

impl std::fmt::Display for ContactMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContactMode {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "push" => Ok(Self::Push),
            "ical" => Ok(Self::Ical),
            other => Err(crate::DomainError::validation(format!(
                "unknown contact mode: {other}"
            ))),
        }
    }
}

/// A notification recipient attached to a reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Identifier within the reminder's contact list
    pub id: i64,
    /// Delivery channel
    pub mode: ContactMode,
    /// Channel-specific address (email address, phone number, ...)
    pub address: String,
}

impl Contact {
    /// Create a new contact
    #[must_use]
    pub fn new(id: i64, mode: ContactMode, address: impl Into<String>) -> Self {
        Self {
            id,
            mode,
            address: address.into(),
        }
    }

    /// Convenience constructor for email contacts
    #[must_use]
    pub fn email(id: i64, address: impl Into<String>) -> Self {
        Self::new(id, ContactMode::Email, address)
    }
}

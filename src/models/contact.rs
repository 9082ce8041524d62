//! Trusted contact model
//!
//! A trusted contact is an unregistered person a user can assign item
//! shares to. Resolving a free-text email to a registered user or a
//! contact happens outside this crate; here a contact is just an identity
//! with a display name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ContactId, UserId};

/// An unregistered participant owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedContact {
    /// Unique identifier
    pub id: ContactId,

    /// The user who manages this contact
    pub owner: UserId,

    /// Display name
    pub name: String,

    /// Optional contact email, for display only
    pub email: Option<String>,

    /// When the contact was created
    pub created_at: DateTime<Utc>,

    /// When the contact was last modified
    pub updated_at: DateTime<Utc>,
}

impl TrustedContact {
    /// Create a new trusted contact
    pub fn new(owner: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ContactId::new(),
            owner,
            name: name.into(),
            email: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a contact with an email
    pub fn with_email(owner: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        let mut contact = Self::new(owner, name);
        contact.email = Some(email.into());
        contact
    }

    /// Validate the contact
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.name.trim().is_empty() {
            return Err(ContactValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(ContactValidationError::NameTooLong(self.name.len()));
        }

        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ContactValidationError::InvalidEmail(email.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for TrustedContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for trusted contacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidEmail(String),
}

impl fmt::Display for ContactValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Contact name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Contact name too long ({} chars, max 100)", len)
            }
            Self::InvalidEmail(email) => write!(f, "Invalid contact email: {}", email),
        }
    }
}

impl std::error::Error for ContactValidationError {}

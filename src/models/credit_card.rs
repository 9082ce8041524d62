//! Credit card model
//!
//! A payment instrument owned by a user. A card may be a virtual/additional
//! card linked to a physical parent card; the parent link is validated by
//! the card service, which has repository access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CardId, UserId};
use super::money::Money;

/// A credit card, physical or virtual
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCard {
    /// Unique identifier
    pub id: CardId,

    /// The user who owns this card
    pub owner: UserId,

    /// Display name (e.g. "Nubank Platinum")
    pub name: String,

    /// Credit limit
    pub limit: Money,

    /// Whether the card can open new invoices
    pub active: bool,

    /// Day of the month the billing cycle closes (1-28)
    pub closing_day: u8,

    /// Day of the month the invoice is due (1-28)
    pub due_day: u8,

    /// Physical parent card, when this is a virtual/additional card
    pub parent_card_id: Option<CardId>,

    /// When the card was created
    pub created_at: DateTime<Utc>,

    /// When the card was last modified
    pub updated_at: DateTime<Utc>,
}

impl CreditCard {
    /// Create a new physical card
    pub fn new(
        owner: UserId,
        name: impl Into<String>,
        limit: Money,
        closing_day: u8,
        due_day: u8,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CardId::new(),
            owner,
            name: name.into(),
            limit,
            active: true,
            closing_day,
            due_day,
            parent_card_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a virtual card linked to a physical parent
    ///
    /// The virtual card inherits the parent's billing days and limit.
    pub fn virtual_of(parent: &CreditCard, name: impl Into<String>) -> Self {
        let mut card = Self::new(
            parent.owner,
            name,
            parent.limit,
            parent.closing_day,
            parent.due_day,
        );
        card.parent_card_id = Some(parent.id);
        card
    }

    /// Whether this is a virtual/additional card
    pub fn is_virtual(&self) -> bool {
        self.parent_card_id.is_some()
    }

    /// Deactivate the card; no new invoices can be opened
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    /// Reactivate the card
    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    /// Update the credit limit
    pub fn set_limit(&mut self, limit: Money) {
        self.limit = limit;
        self.updated_at = Utc::now();
    }

    /// Validate the card
    pub fn validate(&self) -> Result<(), CardValidationError> {
        if self.name.trim().is_empty() {
            return Err(CardValidationError::EmptyName);
        }

        if !(1..=28).contains(&self.closing_day) {
            return Err(CardValidationError::BadClosingDay(self.closing_day));
        }

        if !(1..=28).contains(&self.due_day) {
            return Err(CardValidationError::BadDueDay(self.due_day));
        }

        if self.limit.is_negative() {
            return Err(CardValidationError::NegativeLimit);
        }

        Ok(())
    }
}

impl fmt::Display for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_virtual() {
            write!(f, "{} (virtual)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Validation errors for credit cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    EmptyName,
    BadClosingDay(u8),
    BadDueDay(u8),
    NegativeLimit,
}

impl fmt::Display for CardValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Card name cannot be empty"),
            Self::BadClosingDay(d) => {
                write!(f, "Closing day must be between 1 and 28, got {}", d)
            }
            Self::BadDueDay(d) => write!(f, "Due day must be between 1 and 28, got {}", d),
            Self::NegativeLimit => write!(f, "Card limit cannot be negative"),
        }
    }
}

impl std::error::Error for CardValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_card() -> CreditCard {
        CreditCard::new(UserId::new(), "Main Card", Money::from_cents(500_000), 25, 5)
    }

    #[test]
    fn test_new_card() {
        let card = test_card();
        assert!(card.active);
        assert!(!card.is_virtual());
        assert!(card.validate().is_ok());
    }

    #[test]
    fn test_virtual_card_inherits_parent() {
        let parent = test_card();
        let virtual_card = CreditCard::virtual_of(&parent, "Online Purchases");

        assert!(virtual_card.is_virtual());
        assert_eq!(virtual_card.parent_card_id, Some(parent.id));
        assert_eq!(virtual_card.owner, parent.owner);
        assert_eq!(virtual_card.due_day, parent.due_day);
        assert_eq!(virtual_card.closing_day, parent.closing_day);
        assert_eq!(virtual_card.limit, parent.limit);
    }

    #[test]
    fn test_activate_deactivate() {
        let mut card = test_card();
        card.deactivate();
        assert!(!card.active);
        card.activate();
        assert!(card.active);
    }

    #[test]
    fn test_day_validation() {
        let mut card = test_card();
        card.due_day = 0;
        assert_eq!(card.validate(), Err(CardValidationError::BadDueDay(0)));

        card.due_day = 5;
        card.closing_day = 31;
        assert_eq!(card.validate(), Err(CardValidationError::BadClosingDay(31)));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let mut card = test_card();
        card.limit = Money::from_cents(-1);
        assert_eq!(card.validate(), Err(CardValidationError::NegativeLimit));
    }
}

//! Item share model
//!
//! One participant's percentage stake in an invoice item, with payment
//! tracking that is independent of the invoice's own payment state. The
//! participant is either a registered user or an unregistered trusted
//! contact; the enum makes the two mutually exclusive by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ContactId, ItemId, ShareId, UserId};
use super::money::Money;

/// Number of decimal places kept when deriving percentages
pub const PERCENT_PRECISION: u32 = 4;

/// Round a fraction to [`PERCENT_PRECISION`] decimal places
pub fn round_percentage(value: f64) -> f64 {
    let scale = 10f64.powi(PERCENT_PRECISION as i32);
    (value * scale).round() / scale
}

/// Who a share belongs to: a registered user or a trusted contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    User(UserId),
    Contact(ContactId),
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{}", id),
            Self::Contact(id) => write!(f, "{}", id),
        }
    }
}

/// One participant's stake in an invoice item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemShare {
    /// Unique identifier
    pub id: ShareId,

    /// The item this share divides
    pub item_id: ItemId,

    /// Who owes this share
    pub participant: Participant,

    /// Fraction of the item in [0, 1]
    pub percentage: f64,

    /// Monetary amount, stored independently of the percentage
    pub amount: Money,

    /// Whether this participant is responsible for paying the invoice itself
    #[serde(default)]
    pub responsible: bool,

    /// Whether the share has been settled
    pub paid: bool,

    /// How the share was settled; always present when paid
    pub payment_method: Option<String>,

    /// When the share was settled; always present when paid
    pub paid_at: Option<DateTime<Utc>>,

    /// When the share was created
    pub created_at: DateTime<Utc>,

    /// When the share was last modified
    pub updated_at: DateTime<Utc>,
}

impl ItemShare {
    /// Create a new unpaid share
    ///
    /// The amount is computed from the percentage against the item's
    /// current amount, rounded to the cent.
    pub fn new(
        item_id: ItemId,
        participant: Participant,
        percentage: f64,
        item_amount: Money,
    ) -> Result<Self, ShareValidationError> {
        validate_percentage(percentage)?;

        let now = Utc::now();
        Ok(Self {
            id: ShareId::new(),
            item_id,
            participant,
            percentage,
            amount: item_amount.percent_of(percentage),
            responsible: false,
            paid: false,
            payment_method: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a share with an explicit amount (used by distribution commits,
    /// where amounts come from the user and percentages are derived)
    pub fn with_amount(
        item_id: ItemId,
        participant: Participant,
        percentage: f64,
        amount: Money,
    ) -> Result<Self, ShareValidationError> {
        let mut share = Self::new(item_id, participant, percentage, Money::zero())?;
        share.amount = amount;
        Ok(share)
    }

    /// Whether the share has been settled
    pub fn is_paid(&self) -> bool {
        self.paid
    }

    /// The method the share was settled with, if paid
    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    /// Mark the share as settled
    pub fn mark_paid(
        &mut self,
        method: impl Into<String>,
        paid_at: DateTime<Utc>,
    ) -> Result<(), ShareValidationError> {
        let method = method.into();
        if method.trim().is_empty() {
            return Err(ShareValidationError::BlankPaymentMethod);
        }

        self.paid = true;
        self.payment_method = Some(method);
        self.paid_at = Some(paid_at);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Clear the paid flag, method and timestamp
    pub fn mark_unpaid(&mut self) {
        self.paid = false;
        self.payment_method = None;
        self.paid_at = None;
        self.updated_at = Utc::now();
    }

    /// Change the percentage, recomputing the amount from the item's
    /// current amount
    pub fn update_percentage(
        &mut self,
        percentage: f64,
        item_amount: Money,
    ) -> Result<(), ShareValidationError> {
        validate_percentage(percentage)?;
        self.percentage = percentage;
        self.amount = item_amount.percent_of(percentage);
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_percentage(percentage: f64) -> Result<(), ShareValidationError> {
    if percentage > 1.0 {
        return Err(ShareValidationError::PercentageAboveOne(percentage));
    }
    if percentage < 0.0 || percentage.is_nan() {
        return Err(ShareValidationError::PercentageNegative(percentage));
    }
    Ok(())
}

/// Validation errors for item shares
#[derive(Debug, Clone, PartialEq)]
pub enum ShareValidationError {
    PercentageAboveOne(f64),
    PercentageNegative(f64),
    BlankPaymentMethod,
}

impl fmt::Display for ShareValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PercentageAboveOne(p) => {
                write!(f, "Share percentage exceeds 1.0: {}", p)
            }
            Self::PercentageNegative(p) => {
                write!(f, "Share percentage cannot be negative: {}", p)
            }
            Self::BlankPaymentMethod => write!(f, "Payment method cannot be blank"),
        }
    }
}

impl std::error::Error for ShareValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_share(percentage: f64, item_cents: i64) -> Result<ItemShare, ShareValidationError> {
        ItemShare::new(
            ItemId::new(),
            Participant::User(UserId::new()),
            percentage,
            Money::from_cents(item_cents),
        )
    }

    #[test]
    fn test_amount_from_percentage() {
        // 50% of 100.00 is exactly 50.00
        let share = user_share(0.5, 10000).unwrap();
        assert_eq!(share.amount, Money::from_cents(5000));
        assert!(!share.is_paid());
    }

    #[test]
    fn test_percentage_range_errors_are_distinct() {
        let above = user_share(1.2, 10000).unwrap_err();
        assert!(matches!(above, ShareValidationError::PercentageAboveOne(_)));
        assert!(above.to_string().contains("exceeds 1.0"));

        let below = user_share(-0.1, 10000).unwrap_err();
        assert!(matches!(below, ShareValidationError::PercentageNegative(_)));
        assert!(below.to_string().contains("negative"));
    }

    #[test]
    fn test_boundary_percentages_accepted() {
        assert!(user_share(0.0, 10000).is_ok());
        assert!(user_share(1.0, 10000).is_ok());
    }

    #[test]
    fn test_paid_round_trip() {
        // markAsPaid stores method and timestamp; markAsUnpaid clears both.
        let mut share = user_share(0.5, 10000).unwrap();
        let t = Utc::now();

        share.mark_paid("PIX", t).unwrap();
        assert!(share.is_paid());
        assert_eq!(share.payment_method(), Some("PIX"));
        assert_eq!(share.paid_at, Some(t));

        share.mark_unpaid();
        assert!(!share.is_paid());
        assert!(share.payment_method().is_none());
        assert!(share.paid_at.is_none());
    }

    #[test]
    fn test_blank_method_rejected() {
        let mut share = user_share(0.5, 10000).unwrap();
        let result = share.mark_paid("   ", Utc::now());
        assert_eq!(result, Err(ShareValidationError::BlankPaymentMethod));
        // No partial mutation
        assert!(!share.is_paid());
        assert!(share.paid_at.is_none());
    }

    #[test]
    fn test_update_percentage_recomputes_amount() {
        let mut share = user_share(0.5, 10000).unwrap();
        share.update_percentage(0.25, Money::from_cents(10000)).unwrap();
        assert_eq!(share.percentage, 0.25);
        assert_eq!(share.amount, Money::from_cents(2500));

        assert!(share
            .update_percentage(1.5, Money::from_cents(10000))
            .is_err());
        // Failed update leaves state untouched
        assert_eq!(share.percentage, 0.25);
    }

    #[test]
    fn test_contact_participant() {
        let contact = ContactId::new();
        let share = ItemShare::new(
            ItemId::new(),
            Participant::Contact(contact),
            0.5,
            Money::from_cents(10000),
        )
        .unwrap();
        assert_eq!(share.participant, Participant::Contact(contact));
    }

    #[test]
    fn test_round_percentage() {
        assert_eq!(round_percentage(0.33333333), 0.3333);
        assert_eq!(round_percentage(0.66666666), 0.6667);
        assert_eq!(round_percentage(0.5), 0.5);
    }

    #[test]
    fn test_serialization() {
        let mut share = user_share(0.5, 10000).unwrap();
        share.mark_paid("PIX", Utc::now()).unwrap();

        let json = serde_json::to_string(&share).unwrap();
        let back: ItemShare = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, share.id);
        assert_eq!(back.participant, share.participant);
        assert!(back.is_paid());
    }
}

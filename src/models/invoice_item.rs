//! Invoice item model
//!
//! One purchased item on an invoice, with installment metadata and a
//! collection of participant shares. Negative amounts are legitimate:
//! chargebacks and refunds appear as credit items.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, InvoiceId, ItemId, ShareId};
use super::item_share::ItemShare;
use super::money::Money;

/// A purchased item belonging to one invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Unique identifier
    pub id: ItemId,

    /// Owning invoice; None once the item has been removed
    pub invoice_id: Option<InvoiceId>,

    /// Merchant description as it appears on the statement
    pub description: String,

    /// Signed amount; negative for credits and chargebacks
    pub amount: Money,

    /// Expense category, None while uncategorized
    pub category_id: Option<CategoryId>,

    /// Date of purchase
    pub purchase_date: NaiveDate,

    /// Installment index, 1-based
    pub installment: u32,

    /// Total number of installments
    pub total_installments: u32,

    /// Import hash for duplicate detection during statement import
    pub import_id: Option<String>,

    /// When the item was created
    pub created_at: DateTime<Utc>,

    /// Participant shares of this item
    #[serde(default)]
    pub shares: Vec<ItemShare>,
}

impl InvoiceItem {
    /// Create a single-installment item, not yet attached to an invoice
    pub fn new(description: impl Into<String>, amount: Money, purchase_date: NaiveDate) -> Self {
        Self {
            id: ItemId::new(),
            invoice_id: None,
            description: description.into(),
            amount,
            category_id: None,
            purchase_date,
            installment: 1,
            total_installments: 1,
            import_id: None,
            created_at: Utc::now(),
            shares: Vec::new(),
        }
    }

    /// Create an installment item (e.g. 3 of 12)
    pub fn with_installments(
        description: impl Into<String>,
        amount: Money,
        purchase_date: NaiveDate,
        installment: u32,
        total_installments: u32,
    ) -> Self {
        let mut item = Self::new(description, amount, purchase_date);
        item.installment = installment;
        item.total_installments = total_installments;
        item
    }

    /// Assign a category
    pub fn set_category(&mut self, category_id: CategoryId) {
        self.category_id = Some(category_id);
    }

    /// Clear the category
    pub fn clear_category(&mut self) {
        self.category_id = None;
    }

    /// Add a share to the item's collection
    ///
    /// Collection maintenance only; the "shares must not exceed the item
    /// amount" rule is enforced when a distribution is committed.
    pub fn add_share(&mut self, share: ItemShare) {
        self.shares.push(share);
    }

    /// Remove a share from the collection
    pub fn remove_share(&mut self, share_id: ShareId) -> Option<ItemShare> {
        let idx = self.shares.iter().position(|s| s.id == share_id)?;
        Some(self.shares.remove(idx))
    }

    /// Sum of all shares' amounts
    pub fn shared_amount(&self) -> Money {
        self.shares.iter().map(|s| s.amount).sum()
    }

    /// Portion of the amount not covered by any share
    pub fn unshared_amount(&self) -> Money {
        self.amount - self.shared_amount()
    }

    /// Whether shares cover the item amount exactly, to the cent
    pub fn is_fully_shared(&self) -> bool {
        self.shared_amount() == self.amount
    }

    /// Validate the item
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.description.trim().is_empty() {
            return Err(ItemValidationError::BlankDescription);
        }

        if self.installment < 1
            || self.total_installments < 1
            || self.installment > self.total_installments
        {
            return Err(ItemValidationError::InstallmentOutOfRange {
                installment: self.installment,
                total: self.total_installments,
            });
        }

        Ok(())
    }

    /// Generate an import ID for duplicate detection
    pub fn generate_import_id(&self) -> String {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.purchase_date.hash(&mut hasher);
        self.amount.cents().hash(&mut hasher);
        self.description.hash(&mut hasher);
        self.installment.hash(&mut hasher);
        format!("imp-{:016x}", hasher.finish())
    }
}

impl fmt::Display for InvoiceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_installments > 1 {
            write!(
                f,
                "{} {} ({}/{}) {}",
                self.purchase_date.format("%Y-%m-%d"),
                self.description,
                self.installment,
                self.total_installments,
                self.amount
            )
        } else {
            write!(
                f,
                "{} {} {}",
                self.purchase_date.format("%Y-%m-%d"),
                self.description,
                self.amount
            )
        }
    }
}

/// Validation errors for invoice items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    BlankDescription,
    InstallmentOutOfRange { installment: u32, total: u32 },
}

impl fmt::Display for ItemValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankDescription => write!(f, "Item description cannot be blank"),
            Self::InstallmentOutOfRange { installment, total } => write!(
                f,
                "Installment {} of {} is out of range (need 1 <= installment <= total)",
                installment, total
            ),
        }
    }
}

impl std::error::Error for ItemValidationError {}

//! Invoice model and billing-cycle state machine
//!
//! An invoice is the monthly statement for one credit card. Its status is
//! never stored independently: it is always re-derived from the pair of
//! amounts and the due date via [`derive_status`], so a stale status cannot
//! diverge from the numbers that define it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CardId, InvoiceId, ItemId};
use super::invoice_item::InvoiceItem;
use super::money::Money;

/// A billing month (year + month)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl BillingMonth {
    /// Create a new billing month; month must be 1-12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The following billing month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// A concrete date within this month; `day` must be 1-28
    pub fn date_on(&self, day: u8) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day as u32)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Status of an invoice, always derived from amounts and dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Awaiting payment, not yet due
    #[default]
    Open,
    /// Partially paid
    Partial,
    /// Fully paid
    Paid,
    /// Unpaid past the due date
    Overdue,
    /// Empty invoice past its due date
    Closed,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Partial => write!(f, "Partial"),
            Self::Paid => write!(f, "Paid"),
            Self::Overdue => write!(f, "Overdue"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Derive an invoice's status from its amounts and due date.
///
/// This is the single source of truth for every transition in the billing
/// state machine; all mutators call it after touching amounts.
pub fn derive_status(
    total: Money,
    paid: Money,
    due_date: NaiveDate,
    today: NaiveDate,
) -> InvoiceStatus {
    if total.is_zero() {
        if due_date < today {
            InvoiceStatus::Closed
        } else {
            InvoiceStatus::Open
        }
    } else if paid >= total {
        InvoiceStatus::Paid
    } else if paid > Money::zero() {
        InvoiceStatus::Partial
    } else if due_date < today {
        InvoiceStatus::Overdue
    } else {
        InvoiceStatus::Open
    }
}

/// The monthly statement for one credit card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,

    /// The card this invoice bills
    pub card_id: CardId,

    /// Billing month
    pub month: BillingMonth,

    /// Payment due date, fixed at creation
    pub due_date: NaiveDate,

    /// Sum of all attached items' amounts
    pub total: Money,

    /// Cumulative recorded payments
    pub paid: Money,

    /// Cached derivation of the status; see [`derive_status`]
    pub status: InvoiceStatus,

    /// Purchased items, in insertion order
    #[serde(default)]
    pub items: Vec<InvoiceItem>,

    /// When the invoice was created
    pub created_at: DateTime<Utc>,

    /// When the invoice was last modified
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a new, empty invoice
    pub fn new(card_id: CardId, month: BillingMonth, due_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: InvoiceId::new(),
            card_id,
            month,
            due_date,
            total: Money::zero(),
            paid: Money::zero(),
            status: InvoiceStatus::Open,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach an item, recomputing the total and status
    pub fn add_item(&mut self, mut item: InvoiceItem, today: NaiveDate) {
        item.invoice_id = Some(self.id);
        self.items.push(item);
        self.recompute(today);
    }

    /// Detach an item, recomputing the total and status
    ///
    /// The returned item has its invoice back-reference cleared.
    pub fn remove_item(&mut self, item_id: ItemId, today: NaiveDate) -> Result<InvoiceItem, InvoiceError> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or(InvoiceError::ItemNotFound(item_id))?;

        let mut item = self.items.remove(idx);
        item.invoice_id = None;
        self.recompute(today);
        Ok(item)
    }

    /// Record a payment against the invoice
    ///
    /// Negative payments are rejected. A payment may not push `paid` past
    /// `total`, except on a zero-total invoice: catch-up reconciliation
    /// payments on an already-closed empty invoice are accepted.
    pub fn record_payment(&mut self, amount: Money, today: NaiveDate) -> Result<(), InvoiceError> {
        if amount.is_negative() {
            return Err(InvoiceError::NegativePayment(amount));
        }

        if !self.total.is_zero() && self.paid + amount > self.total {
            return Err(InvoiceError::PaymentExceedsTotal {
                total: self.total,
                paid: self.paid,
                attempted: amount,
            });
        }

        self.paid += amount;
        self.recompute(today);
        Ok(())
    }

    /// Re-derive the status without changing amounts; idempotent
    ///
    /// Used for pure time-based transitions such as Open -> Overdue.
    pub fn refresh_status(&mut self, today: NaiveDate) {
        self.status = derive_status(self.total, self.paid, self.due_date, today);
    }

    /// Find an item by id
    pub fn item(&self, item_id: ItemId) -> Option<&InvoiceItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Find an item by id, mutably
    pub fn item_mut(&mut self, item_id: ItemId) -> Option<&mut InvoiceItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Amount still owed on the invoice
    pub fn remaining(&self) -> Money {
        self.total - self.paid
    }

    fn recompute(&mut self, today: NaiveDate) {
        self.total = self.items.iter().map(|i| i.amount).sum();
        self.refresh_status(today);
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Invoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.month, self.total, self.status)
    }
}

/// Errors from invoice mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    ItemNotFound(ItemId),
    NegativePayment(Money),
    PaymentExceedsTotal {
        total: Money,
        paid: Money,
        attempted: Money,
    },
}

impl fmt::Display for InvoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "Item {} is not on this invoice", id),
            Self::NegativePayment(amount) => {
                write!(f, "Payment amount cannot be negative, got {}", amount)
            }
            Self::PaymentExceedsTotal {
                total,
                paid,
                attempted,
            } => write!(
                f,
                "Payment of {} would exceed invoice total {} (already paid {})",
                attempted, total, paid
            ),
        }
    }
}

impl std::error::Error for InvoiceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_invoice(due: NaiveDate) -> Invoice {
        Invoice::new(CardId::new(), BillingMonth::new(2024, 1).unwrap(), due)
    }

    fn item(amount_cents: i64) -> InvoiceItem {
        InvoiceItem::new("Coffee", Money::from_cents(amount_cents), date(2024, 1, 3))
    }

    #[test]
    fn test_billing_month() {
        assert!(BillingMonth::new(2024, 13).is_none());
        assert!(BillingMonth::new(2024, 0).is_none());

        let jan = BillingMonth::new(2024, 1).unwrap();
        assert_eq!(jan.to_string(), "2024-01");
        assert_eq!(jan.next(), BillingMonth::new(2024, 2).unwrap());

        let dec = BillingMonth::new(2024, 12).unwrap();
        assert_eq!(dec.next(), BillingMonth::new(2025, 1).unwrap());
    }

    #[test]
    fn test_derive_status_table() {
        let due = date(2024, 1, 10);
        let before = date(2024, 1, 5);
        let after = date(2024, 2, 1);
        let m = Money::from_cents;

        // Zero total: Open before due, Closed after
        assert_eq!(derive_status(m(0), m(0), due, before), InvoiceStatus::Open);
        assert_eq!(derive_status(m(0), m(0), due, due), InvoiceStatus::Open);
        assert_eq!(derive_status(m(0), m(0), due, after), InvoiceStatus::Closed);

        // Fully paid wins regardless of date
        assert_eq!(derive_status(m(100), m(100), due, after), InvoiceStatus::Paid);
        assert_eq!(derive_status(m(100), m(150), due, after), InvoiceStatus::Paid);

        // Any payment short of the total is Partial, even past due
        assert_eq!(derive_status(m(100), m(50), due, before), InvoiceStatus::Partial);
        assert_eq!(derive_status(m(100), m(50), due, after), InvoiceStatus::Partial);

        // Unpaid: Overdue strictly after due date, else Open
        assert_eq!(derive_status(m(100), m(0), due, after), InvoiceStatus::Overdue);
        assert_eq!(derive_status(m(100), m(0), due, due), InvoiceStatus::Open);
        assert_eq!(derive_status(m(100), m(0), due, before), InvoiceStatus::Open);
    }

    #[test]
    fn test_refresh_is_pure_and_idempotent() {
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.add_item(item(10000), date(2024, 1, 5));

        let today = date(2024, 2, 1);
        invoice.refresh_status(today);
        let first = invoice.status;
        invoice.refresh_status(today);
        assert_eq!(invoice.status, first);
        assert_eq!(first, InvoiceStatus::Overdue);
    }

    #[test]
    fn test_overdue_then_paid_scenario() {
        // Due 2024-01-10, one item of 100.00, today 2024-02-01 -> Overdue.
        // Paying 100.00 flips it to Paid.
        let today = date(2024, 2, 1);
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.add_item(item(10000), today);
        assert_eq!(invoice.status, InvoiceStatus::Overdue);

        invoice.record_payment(Money::from_cents(10000), today).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.remaining(), Money::zero());
    }

    #[test]
    fn test_closed_then_overdue_scenario() {
        // Empty invoice past its due date is Closed; adding an item of
        // 50.00 makes it Overdue, not Closed.
        let today = date(2024, 2, 1);
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.refresh_status(today);
        assert_eq!(invoice.status, InvoiceStatus::Closed);

        invoice.add_item(item(5000), today);
        assert_eq!(invoice.status, InvoiceStatus::Overdue);
        assert_eq!(invoice.total, Money::from_cents(5000));
    }

    #[test]
    fn test_add_then_remove_restores_total() {
        let today = date(2024, 1, 5);
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.add_item(item(2500), today);
        let before = invoice.total;

        let extra = item(7300);
        let extra_id = extra.id;
        invoice.add_item(extra, today);
        assert_eq!(invoice.total, Money::from_cents(9800));

        let removed = invoice.remove_item(extra_id, today).unwrap();
        assert_eq!(invoice.total, before);
        assert!(removed.invoice_id.is_none());
    }

    #[test]
    fn test_remove_missing_item() {
        let mut invoice = test_invoice(date(2024, 1, 10));
        let result = invoice.remove_item(ItemId::new(), date(2024, 1, 5));
        assert!(matches!(result, Err(InvoiceError::ItemNotFound(_))));
    }

    #[test]
    fn test_negative_item_reduces_total() {
        let today = date(2024, 1, 5);
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.add_item(item(10000), today);
        invoice.add_item(item(-2500), today); // refund
        assert_eq!(invoice.total, Money::from_cents(7500));
    }

    #[test]
    fn test_negative_payment_rejected() {
        let today = date(2024, 1, 5);
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.add_item(item(10000), today);

        let result = invoice.record_payment(Money::from_cents(-1), today);
        assert!(matches!(result, Err(InvoiceError::NegativePayment(_))));
        assert_eq!(invoice.paid, Money::zero());
    }

    #[test]
    fn test_overpayment_rejected() {
        let today = date(2024, 1, 5);
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.add_item(item(10000), today);

        invoice.record_payment(Money::from_cents(8000), today).unwrap();
        let result = invoice.record_payment(Money::from_cents(5000), today);
        assert!(matches!(
            result,
            Err(InvoiceError::PaymentExceedsTotal { .. })
        ));
        // Prior state untouched
        assert_eq!(invoice.paid, Money::from_cents(8000));
        assert_eq!(invoice.status, InvoiceStatus::Partial);
    }

    #[test]
    fn test_zero_total_accepts_catchup_payment() {
        // A zero-amount closed invoice still accepts non-negative payments
        // as a precursor to reconciliation, and stays Closed.
        let today = date(2024, 2, 1);
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.refresh_status(today);
        assert_eq!(invoice.status, InvoiceStatus::Closed);

        invoice.record_payment(Money::from_cents(3000), today).unwrap();
        assert_eq!(invoice.paid, Money::from_cents(3000));
        assert_eq!(invoice.status, InvoiceStatus::Closed);
    }

    #[test]
    fn test_serialization() {
        let mut invoice = test_invoice(date(2024, 1, 10));
        invoice.add_item(item(4200), date(2024, 1, 5));

        let json = serde_json::to_string(&invoice).unwrap();
        let back: Invoice = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, invoice.id);
        assert_eq!(back.total, invoice.total);
        assert_eq!(back.items.len(), 1);
    }
}

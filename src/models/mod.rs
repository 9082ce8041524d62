//! Core data models for cardledger
//!
//! All entities use strongly-typed UUID identifiers assigned at
//! construction and carry their own small validation-error enums; services
//! translate those into [`crate::error::LedgerError`] at the boundary.

pub mod category;
pub mod contact;
pub mod credit_card;
pub mod ids;
pub mod invoice;
pub mod invoice_item;
pub mod item_share;
pub mod merchant_rule;
pub mod money;

pub use category::{Category, CategoryValidationError};
pub use contact::{ContactValidationError, TrustedContact};
pub use credit_card::{CardValidationError, CreditCard};
pub use ids::{CardId, CategoryId, ContactId, InvoiceId, ItemId, RuleId, ShareId, UserId};
pub use invoice::{derive_status, BillingMonth, Invoice, InvoiceError, InvoiceStatus};
pub use invoice_item::{InvoiceItem, ItemValidationError};
pub use item_share::{
    round_percentage, ItemShare, Participant, ShareValidationError, PERCENT_PRECISION,
};
pub use merchant_rule::{
    confidence_score, normalize_merchant_key, AutoApplyPolicy, MerchantCategoryRule,
    RuleValidationError,
};
pub use money::{Money, MoneyParseError};

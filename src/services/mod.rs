//! Business logic services
//!
//! Services hold a borrowed [`crate::storage::Storage`] and implement the
//! operations that span aggregates or need persistence. Each mutating
//! operation persists the touched stores and leaves an audit entry.

pub mod card;
pub mod categorize;
pub mod import;
pub mod invoice;
pub mod split;

pub use card::CardService;
pub use categorize::{CategorizeService, CategorySuggestion};
pub use import::{ImportOptions, ImportReport, ImportService};
pub use invoice::InvoiceService;
pub use split::SplitService;

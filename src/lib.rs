//! # cardledger
//!
//! Core library for tracking credit card spending: monthly invoices with a
//! derived billing state machine, item splitting among users and trusted
//! contacts, statement import, and confidence-gated merchant
//! auto-categorization.
//!
//! Data lives in JSON files under an XDG-style directory, with every
//! mutation recorded in an append-only audit log.
//!
//! ## Example
//!
//! ```no_run
//! use cardledger::config::LedgerPaths;
//! use cardledger::models::{BillingMonth, Money, UserId};
//! use cardledger::services::CardService;
//! use cardledger::storage::Storage;
//!
//! # fn main() -> Result<(), cardledger::LedgerError> {
//! let paths = LedgerPaths::new()?;
//! let storage = Storage::open(&paths)?;
//!
//! let cards = CardService::new(&storage);
//! let card = cards.create_card(
//!     UserId::new(),
//!     "Main Card",
//!     Money::from_units(5000, 0),
//!     25,
//!     5,
//! )?;
//! let invoice = cards.open_invoice(card.id, BillingMonth::new(2026, 9).unwrap())?;
//! println!("{}", invoice);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};

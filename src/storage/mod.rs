//! Storage layer
//!
//! JSON-file repositories behind in-memory maps, coordinated by [`Storage`].
//! Each repository owns one file; writes go through an atomic
//! temp-file-then-rename so a crash never leaves a half-written store.

pub mod cards;
pub mod categories;
pub mod contacts;
pub mod file_io;
pub mod invoices;
pub mod rules;

pub use cards::CardRepository;
pub use categories::CategoryRepository;
pub use contacts::ContactRepository;
pub use invoices::InvoiceRepository;
pub use rules::RuleRepository;

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::LedgerPaths;
use crate::error::LedgerError;

/// Coordinates all repositories and the audit log
pub struct Storage {
    pub cards: CardRepository,
    pub invoices: InvoiceRepository,
    pub categories: CategoryRepository,
    pub contacts: ContactRepository,
    pub rules: RuleRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create storage rooted at the given paths and load every store
    pub fn open(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        paths.ensure_directories()?;

        let storage = Self {
            cards: CardRepository::new(paths.cards_file()),
            invoices: InvoiceRepository::new(paths.invoices_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            contacts: ContactRepository::new(paths.contacts_file()),
            rules: RuleRepository::new(paths.rules_file()),
            audit: AuditLogger::new(paths.audit_log()),
        };

        storage.load_all()?;
        Ok(storage)
    }

    /// Reload every store from disk
    pub fn load_all(&self) -> Result<(), LedgerError> {
        self.cards.load()?;
        self.invoices.load()?;
        self.categories.load()?;
        self.contacts.load()?;
        self.rules.load()?;
        Ok(())
    }

    /// Persist every store to disk
    pub fn save_all(&self) -> Result<(), LedgerError> {
        self.cards.save()?;
        self.invoices.save()?;
        self.categories.save()?;
        self.contacts.save()?;
        self.rules.save()?;
        Ok(())
    }

    /// The audit logger
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Record the creation of an entity in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), LedgerError> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Record an update with before/after snapshots
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        summary: Option<String>,
    ) -> Result<(), LedgerError> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            summary,
        ))
    }

    /// Record the deletion of an entity in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), LedgerError> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }

    /// Record several audit entries as one contiguous batch
    pub fn log_batch(&self, entries: &[AuditEntry]) -> Result<(), LedgerError> {
        self.audit.log_batch(entries)
    }
}

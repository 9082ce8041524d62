//! Invoice management service
//!
//! Item attachment, payments, and time-based status refresh. The invoice
//! aggregate does the state-machine work; this service loads it, applies
//! the mutation, persists it and audits the change.

use chrono::Utc;

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Invoice, InvoiceError, InvoiceId, InvoiceItem, ItemId, Money};
use crate::storage::Storage;

/// Service for invoice operations
pub struct InvoiceService<'a> {
    storage: &'a Storage,
}

impl<'a> InvoiceService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Get an invoice by id
    pub fn get(&self, invoice_id: InvoiceId) -> LedgerResult<Invoice> {
        self.storage
            .invoices
            .get(invoice_id)?
            .ok_or_else(|| LedgerError::invoice_not_found(invoice_id.to_string()))
    }

    /// Attach an item to an invoice
    ///
    /// The invoice total and status are recomputed; an item added to an
    /// empty invoice past its due date turns it Overdue, not Closed.
    pub fn add_item(&self, invoice_id: InvoiceId, item: InvoiceItem) -> LedgerResult<Invoice> {
        item.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let mut invoice = self.get(invoice_id)?;
        let item_id = item.id;
        let description = item.description.clone();

        invoice.add_item(item, Utc::now().date_naive());

        self.storage.invoices.upsert(invoice.clone())?;
        self.storage.invoices.save()?;

        // The item is persisted inside the aggregate; audit it on its own
        // so item history is visible without diffing invoice snapshots.
        if let Some(item) = invoice.item(item_id) {
            self.storage.log_create(
                EntityType::InvoiceItem,
                item_id.to_string(),
                Some(description),
                item,
            )?;
        }

        Ok(invoice)
    }

    /// Detach an item from an invoice
    pub fn remove_item(&self, invoice_id: InvoiceId, item_id: ItemId) -> LedgerResult<Invoice> {
        let mut invoice = self.get(invoice_id)?;

        let removed = invoice
            .remove_item(item_id, Utc::now().date_naive())
            .map_err(map_invoice_error)?;

        self.storage.invoices.upsert(invoice.clone())?;
        self.storage.invoices.save()?;
        self.storage.log_delete(
            EntityType::InvoiceItem,
            item_id.to_string(),
            Some(removed.description.clone()),
            &removed,
        )?;

        Ok(invoice)
    }

    /// Record a payment against an invoice
    pub fn record_payment(&self, invoice_id: InvoiceId, amount: Money) -> LedgerResult<Invoice> {
        let mut invoice = self.get(invoice_id)?;
        let before = invoice.clone();

        invoice
            .record_payment(amount, Utc::now().date_naive())
            .map_err(map_invoice_error)?;

        self.storage.invoices.upsert(invoice.clone())?;
        self.storage.invoices.save()?;
        self.storage.log_update(
            EntityType::Invoice,
            invoice.id.to_string(),
            Some(invoice.month.to_string()),
            &before,
            &invoice,
            Some(format!("payment of {}", amount)),
        )?;

        Ok(invoice)
    }

    /// Re-derive the status of every invoice against today's date
    ///
    /// Pure time-based transitions (Open -> Overdue, empty Open -> Closed)
    /// happen here; amounts are never touched. Returns the invoices whose
    /// status actually changed.
    pub fn refresh_statuses(&self) -> LedgerResult<Vec<Invoice>> {
        let today = Utc::now().date_naive();
        let mut changed = Vec::new();

        for mut invoice in self.storage.invoices.get_all()? {
            let before = invoice.status;
            invoice.refresh_status(today);
            if invoice.status != before {
                self.storage.invoices.upsert(invoice.clone())?;
                changed.push(invoice);
            }
        }

        if !changed.is_empty() {
            self.storage.invoices.save()?;
        }

        Ok(changed)
    }
}

fn map_invoice_error(err: InvoiceError) -> LedgerError {
    match err {
        InvoiceError::ItemNotFound(id) => LedgerError::item_not_found(id.to_string()),
        InvoiceError::NegativePayment(_) => LedgerError::Validation(err.to_string()),
        InvoiceError::PaymentExceedsTotal {
            total,
            paid,
            attempted,
        } => LedgerError::PaymentExceedsTotal {
            total,
            paid,
            attempted,
        },
    }
}

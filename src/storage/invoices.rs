//! Invoice repository for JSON storage
//!
//! Invoices embed their items (and items their shares), so one upsert
//! persists a whole aggregate.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{BillingMonth, CardId, Invoice, InvoiceId};

use super::cards::{read_lock, write_lock};
use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct InvoiceData {
    invoices: Vec<Invoice>,
}

/// Repository for invoice persistence with a per-card index
pub struct InvoiceRepository {
    path: PathBuf,
    data: RwLock<HashMap<InvoiceId, Invoice>>,
    /// Index: card id -> invoice ids
    by_card: RwLock<HashMap<CardId, Vec<InvoiceId>>>,
}

impl InvoiceRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_card: RwLock::new(HashMap::new()),
        }
    }

    /// Load invoices from disk and rebuild the card index
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: InvoiceData = read_json(&self.path)?;

        let mut data = write_lock(&self.data)?;
        let mut by_card = write_lock(&self.by_card)?;

        data.clear();
        by_card.clear();

        for invoice in file_data.invoices {
            by_card.entry(invoice.card_id).or_default().push(invoice.id);
            data.insert(invoice.id, invoice);
        }

        Ok(())
    }

    /// Save invoices to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let data = read_lock(&self.data)?;

        let mut invoices: Vec<_> = data.values().cloned().collect();
        invoices.sort_by(|a, b| a.month.cmp(&b.month).then(a.created_at.cmp(&b.created_at)));

        write_json_atomic(&self.path, &InvoiceData { invoices })
    }

    /// Get an invoice by ID
    pub fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, LedgerError> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// All invoices for one card, oldest month first
    pub fn get_by_card(&self, card_id: CardId) -> Result<Vec<Invoice>, LedgerError> {
        let data = read_lock(&self.data)?;
        let by_card = read_lock(&self.by_card)?;

        let ids = by_card.get(&card_id).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut invoices: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        invoices.sort_by(|a, b| a.month.cmp(&b.month));
        Ok(invoices)
    }

    /// The invoice for one card and billing month, if it exists
    pub fn find_by_card_month(
        &self,
        card_id: CardId,
        month: BillingMonth,
    ) -> Result<Option<Invoice>, LedgerError> {
        let data = read_lock(&self.data)?;
        Ok(data
            .values()
            .find(|i| i.card_id == card_id && i.month == month)
            .cloned())
    }

    /// All invoices, oldest month first
    pub fn get_all(&self) -> Result<Vec<Invoice>, LedgerError> {
        let data = read_lock(&self.data)?;
        let mut invoices: Vec<_> = data.values().cloned().collect();
        invoices.sort_by(|a, b| a.month.cmp(&b.month).then(a.created_at.cmp(&b.created_at)));
        Ok(invoices)
    }

    /// Insert or update an invoice aggregate
    pub fn upsert(&self, invoice: Invoice) -> Result<(), LedgerError> {
        let mut data = write_lock(&self.data)?;
        let mut by_card = write_lock(&self.by_card)?;

        if let Some(old) = data.get(&invoice.id) {
            if let Some(ids) = by_card.get_mut(&old.card_id) {
                ids.retain(|&id| id != invoice.id);
            }
        }

        by_card.entry(invoice.card_id).or_default().push(invoice.id);
        data.insert(invoice.id, invoice);
        Ok(())
    }

    /// Number of invoices
    pub fn count(&self) -> Result<usize, LedgerError> {
        Ok(read_lock(&self.data)?.len())
    }
}

//! Item splitting service
//!
//! Divides an invoice item among participants and tracks per-share
//! settlement. A distribution is committed atomically: the item's share
//! collection is replaced wholesale, so a failed validation never leaves
//! a half-applied split behind.

use chrono::Utc;

use crate::audit::{AuditEntry, EntityType};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    round_percentage, Invoice, InvoiceId, ItemId, ItemShare, Money, Participant, ShareId,
};
use crate::storage::Storage;

/// Service for splitting items and settling shares
pub struct SplitService<'a> {
    storage: &'a Storage,
}

impl<'a> SplitService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Replace an item's shares with an explicit amount distribution
    ///
    /// Amounts come from the user; percentages are derived from them. The
    /// distribution may cover less than the item (the rest stays with the
    /// card owner) but never more. When it covers the item exactly, the
    /// last share's percentage absorbs rounding drift so percentages sum
    /// to 1.
    pub fn commit_distribution(
        &self,
        invoice_id: InvoiceId,
        item_id: ItemId,
        distribution: &[(Participant, Money)],
    ) -> LedgerResult<Vec<ItemShare>> {
        let mut invoice = self.get_invoice(invoice_id)?;
        let item_amount = self.item_amount(&invoice, item_id)?;

        for (_, amount) in distribution {
            if amount.is_negative() {
                return Err(LedgerError::Validation(format!(
                    "Share amount cannot be negative, got {}",
                    amount
                )));
            }
        }

        let distributed: Money = distribution.iter().map(|(_, a)| *a).sum();
        if distributed > item_amount && !item_amount.is_negative() {
            return Err(LedgerError::DistributionExceedsItem {
                item_amount,
                distributed,
            });
        }

        let exact = distributed == item_amount;
        let mut shares = Vec::with_capacity(distribution.len());
        let mut percent_so_far = 0.0;

        for (idx, (participant, amount)) in distribution.iter().enumerate() {
            let is_last = idx == distribution.len() - 1;
            let percentage = if exact && is_last {
                round_percentage(1.0 - percent_so_far)
            } else if item_amount.is_zero() {
                0.0
            } else {
                round_percentage(amount.cents() as f64 / item_amount.cents() as f64)
            };
            percent_so_far += percentage;

            let share = ItemShare::with_amount(item_id, *participant, percentage, *amount)
                .map_err(|e| LedgerError::Validation(e.to_string()))?;
            shares.push(share);
        }

        self.replace_shares(&mut invoice, item_id, shares.clone())?;
        Ok(shares)
    }

    /// Split an item evenly among the given participants
    ///
    /// Cent remainders go to the last participant, so the shares always
    /// cover the item exactly.
    pub fn divide_equally(
        &self,
        invoice_id: InvoiceId,
        item_id: ItemId,
        participants: &[Participant],
    ) -> LedgerResult<Vec<ItemShare>> {
        if participants.is_empty() {
            return Err(LedgerError::Validation(
                "Cannot divide an item among zero participants".into(),
            ));
        }

        let invoice = self.get_invoice(invoice_id)?;
        let item_amount = self.item_amount(&invoice, item_id)?;

        let parts = item_amount.split_even(participants.len());
        let distribution: Vec<_> = participants.iter().copied().zip(parts).collect();
        self.commit_distribution(invoice_id, item_id, &distribution)
    }

    /// Mark one share as settled
    pub fn mark_share_paid(
        &self,
        invoice_id: InvoiceId,
        item_id: ItemId,
        share_id: ShareId,
        method: &str,
    ) -> LedgerResult<ItemShare> {
        let marked = self.mark_shares_paid(invoice_id, item_id, &[share_id], method)?;
        marked
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::Validation("Share is already paid".into()))
    }

    /// Mark several shares as settled in one operation
    ///
    /// Shares that are already paid are skipped rather than re-stamped, so
    /// the original payment method and timestamp survive a retry. Returns
    /// the shares that actually changed.
    pub fn mark_shares_paid(
        &self,
        invoice_id: InvoiceId,
        item_id: ItemId,
        share_ids: &[ShareId],
        method: &str,
    ) -> LedgerResult<Vec<ItemShare>> {
        let mut invoice = self.get_invoice(invoice_id)?;
        let paid_at = Utc::now();
        let mut changed = Vec::new();
        let mut entries = Vec::new();

        {
            let item = invoice
                .item_mut(item_id)
                .ok_or_else(|| LedgerError::item_not_found(item_id.to_string()))?;

            for share_id in share_ids {
                let share = item
                    .shares
                    .iter_mut()
                    .find(|s| s.id == *share_id)
                    .ok_or_else(|| LedgerError::NotFound {
                        entity_type: "Item share",
                        identifier: share_id.to_string(),
                    })?;

                if share.is_paid() {
                    continue;
                }

                let before = share.clone();
                share
                    .mark_paid(method, paid_at)
                    .map_err(|e| LedgerError::Validation(e.to_string()))?;

                entries.push(AuditEntry::update(
                    EntityType::ItemShare,
                    share.id.to_string(),
                    None,
                    &before,
                    &share.clone(),
                    Some(format!("paid via {}", method.trim())),
                ));
                changed.push(share.clone());
            }
        }

        if !changed.is_empty() {
            self.storage.invoices.upsert(invoice)?;
            self.storage.invoices.save()?;
            self.storage.log_batch(&entries)?;
        }

        Ok(changed)
    }

    /// Clear a share's settled state
    pub fn mark_share_unpaid(
        &self,
        invoice_id: InvoiceId,
        item_id: ItemId,
        share_id: ShareId,
    ) -> LedgerResult<ItemShare> {
        let mut invoice = self.get_invoice(invoice_id)?;
        let updated;

        {
            let item = invoice
                .item_mut(item_id)
                .ok_or_else(|| LedgerError::item_not_found(item_id.to_string()))?;

            let share = item
                .shares
                .iter_mut()
                .find(|s| s.id == share_id)
                .ok_or_else(|| LedgerError::NotFound {
                    entity_type: "Item share",
                    identifier: share_id.to_string(),
                })?;

            let before = share.clone();
            share.mark_unpaid();
            updated = share.clone();

            self.storage.log_update(
                EntityType::ItemShare,
                share_id.to_string(),
                None,
                &before,
                &updated,
                Some("marked unpaid".to_string()),
            )?;
        }

        self.storage.invoices.upsert(invoice)?;
        self.storage.invoices.save()?;
        Ok(updated)
    }

    /// Change one share's percentage, recomputing its amount
    ///
    /// The updated distribution must still fit inside the item.
    pub fn update_share_percentage(
        &self,
        invoice_id: InvoiceId,
        item_id: ItemId,
        share_id: ShareId,
        percentage: f64,
    ) -> LedgerResult<ItemShare> {
        let mut invoice = self.get_invoice(invoice_id)?;
        let item_amount = self.item_amount(&invoice, item_id)?;
        let updated;

        {
            let item = invoice
                .item_mut(item_id)
                .ok_or_else(|| LedgerError::item_not_found(item_id.to_string()))?;

            let share = item
                .shares
                .iter_mut()
                .find(|s| s.id == share_id)
                .ok_or_else(|| LedgerError::NotFound {
                    entity_type: "Item share",
                    identifier: share_id.to_string(),
                })?;

            let before = share.clone();
            share
                .update_percentage(percentage, item_amount)
                .map_err(|e| LedgerError::Validation(e.to_string()))?;
            updated = share.clone();

            let distributed = item.shared_amount();
            if distributed > item_amount && !item_amount.is_negative() {
                return Err(LedgerError::DistributionExceedsItem {
                    item_amount,
                    distributed,
                });
            }

            self.storage.log_update(
                EntityType::ItemShare,
                share_id.to_string(),
                None,
                &before,
                &updated,
                Some(format!("percentage -> {}", percentage)),
            )?;
        }

        self.storage.invoices.upsert(invoice)?;
        self.storage.invoices.save()?;
        Ok(updated)
    }

    fn get_invoice(&self, invoice_id: InvoiceId) -> LedgerResult<Invoice> {
        self.storage
            .invoices
            .get(invoice_id)?
            .ok_or_else(|| LedgerError::invoice_not_found(invoice_id.to_string()))
    }

    fn item_amount(&self, invoice: &Invoice, item_id: ItemId) -> LedgerResult<Money> {
        invoice
            .item(item_id)
            .map(|i| i.amount)
            .ok_or_else(|| LedgerError::item_not_found(item_id.to_string()))
    }

    fn replace_shares(
        &self,
        invoice: &mut Invoice,
        item_id: ItemId,
        shares: Vec<ItemShare>,
    ) -> LedgerResult<()> {
        let mut entries = Vec::with_capacity(shares.len());

        {
            let item = invoice
                .item_mut(item_id)
                .ok_or_else(|| LedgerError::item_not_found(item_id.to_string()))?;

            for old in &item.shares {
                entries.push(AuditEntry::delete(
                    EntityType::ItemShare,
                    old.id.to_string(),
                    None,
                    old,
                ));
            }
            for share in &shares {
                entries.push(AuditEntry::create(
                    EntityType::ItemShare,
                    share.id.to_string(),
                    None,
                    share,
                ));
            }

            item.shares = shares;
        }

        self.storage.invoices.upsert(invoice.clone())?;
        self.storage.invoices.save()?;
        self.storage.log_batch(&entries)?;
        Ok(())
    }
}

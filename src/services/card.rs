//! Card management service
//!
//! Card creation and lifecycle, plus opening monthly invoices. Cross-card
//! rules (virtual cards must hang off an active physical parent, one
//! invoice per card and month) live here because they need repository
//! access the models don't have.

use chrono::Utc;

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{BillingMonth, CardId, CreditCard, Invoice, Money, UserId};
use crate::storage::Storage;

/// Service for credit card operations
pub struct CardService<'a> {
    storage: &'a Storage,
}

impl<'a> CardService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a physical card
    pub fn create_card(
        &self,
        owner: UserId,
        name: &str,
        limit: Money,
        closing_day: u8,
        due_day: u8,
    ) -> LedgerResult<CreditCard> {
        let card = CreditCard::new(owner, name.trim(), limit, closing_day, due_day);
        card.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.storage.cards.upsert(card.clone())?;
        self.storage.cards.save()?;
        self.storage.log_create(
            EntityType::CreditCard,
            card.id.to_string(),
            Some(card.name.clone()),
            &card,
        )?;

        Ok(card)
    }

    /// Create a virtual card linked to a physical parent
    ///
    /// The parent must exist, be a physical card, and be active.
    pub fn create_virtual_card(&self, parent_id: CardId, name: &str) -> LedgerResult<CreditCard> {
        let parent = self
            .storage
            .cards
            .get(parent_id)?
            .ok_or_else(|| LedgerError::card_not_found(parent_id.to_string()))?;

        if parent.is_virtual() {
            return Err(LedgerError::Validation(format!(
                "Card '{}' is itself virtual and cannot have virtual cards",
                parent.name
            )));
        }

        if !parent.active {
            return Err(LedgerError::Validation(format!(
                "Card '{}' is inactive and cannot have virtual cards",
                parent.name
            )));
        }

        let card = CreditCard::virtual_of(&parent, name.trim());
        card.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.storage.cards.upsert(card.clone())?;
        self.storage.cards.save()?;
        self.storage.log_create(
            EntityType::CreditCard,
            card.id.to_string(),
            Some(card.name.clone()),
            &card,
        )?;

        Ok(card)
    }

    /// Deactivate a card; existing invoices are unaffected
    pub fn deactivate_card(&self, card_id: CardId) -> LedgerResult<CreditCard> {
        let mut card = self
            .storage
            .cards
            .get(card_id)?
            .ok_or_else(|| LedgerError::card_not_found(card_id.to_string()))?;

        let before = card.clone();
        card.deactivate();

        self.storage.cards.upsert(card.clone())?;
        self.storage.cards.save()?;
        self.storage.log_update(
            EntityType::CreditCard,
            card.id.to_string(),
            Some(card.name.clone()),
            &before,
            &card,
            Some("deactivated".to_string()),
        )?;

        Ok(card)
    }

    /// Reactivate a card
    pub fn activate_card(&self, card_id: CardId) -> LedgerResult<CreditCard> {
        let mut card = self
            .storage
            .cards
            .get(card_id)?
            .ok_or_else(|| LedgerError::card_not_found(card_id.to_string()))?;

        let before = card.clone();
        card.activate();

        self.storage.cards.upsert(card.clone())?;
        self.storage.cards.save()?;
        self.storage.log_update(
            EntityType::CreditCard,
            card.id.to_string(),
            Some(card.name.clone()),
            &before,
            &card,
            Some("activated".to_string()),
        )?;

        Ok(card)
    }

    /// Open the invoice for one card and billing month
    ///
    /// The due date comes from the card's due day within the billing month.
    /// A card can have at most one invoice per month.
    pub fn open_invoice(&self, card_id: CardId, month: BillingMonth) -> LedgerResult<Invoice> {
        let card = self
            .storage
            .cards
            .get(card_id)?
            .ok_or_else(|| LedgerError::card_not_found(card_id.to_string()))?;

        if !card.active {
            return Err(LedgerError::Validation(format!(
                "Card '{}' is inactive and cannot open invoices",
                card.name
            )));
        }

        if self.storage.invoices.find_by_card_month(card_id, month)?.is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Invoice",
                identifier: format!("{} {}", card.name, month),
            });
        }

        let due_date = month.date_on(card.due_day).ok_or_else(|| {
            LedgerError::Validation(format!(
                "Due day {} does not exist in {}",
                card.due_day, month
            ))
        })?;

        let mut invoice = Invoice::new(card_id, month, due_date);
        invoice.refresh_status(Utc::now().date_naive());

        self.storage.invoices.upsert(invoice.clone())?;
        self.storage.invoices.save()?;
        self.storage.log_create(
            EntityType::Invoice,
            invoice.id.to_string(),
            Some(month.to_string()),
            &invoice,
        )?;

        Ok(invoice)
    }

    /// All cards owned by a user
    pub fn list_cards(&self, owner: UserId) -> LedgerResult<Vec<CreditCard>> {
        self.storage.cards.get_by_owner(owner)
    }
}

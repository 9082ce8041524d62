//! Credit card repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{CardId, CreditCard, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CardData {
    cards: Vec<CreditCard>,
}

/// Repository for credit card persistence
pub struct CardRepository {
    path: PathBuf,
    data: RwLock<HashMap<CardId, CreditCard>>,
    /// Index: owner -> card ids
    by_owner: RwLock<HashMap<UserId, Vec<CardId>>>,
}

impl CardRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_owner: RwLock::new(HashMap::new()),
        }
    }

    /// Load cards from disk and rebuild the owner index
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: CardData = read_json(&self.path)?;

        let mut data = write_lock(&self.data)?;
        let mut by_owner = write_lock(&self.by_owner)?;

        data.clear();
        by_owner.clear();

        for card in file_data.cards {
            by_owner.entry(card.owner).or_default().push(card.id);
            data.insert(card.id, card);
        }

        Ok(())
    }

    /// Save cards to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let data = read_lock(&self.data)?;

        let mut cards: Vec<_> = data.values().cloned().collect();
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &CardData { cards })
    }

    /// Get a card by ID
    pub fn get(&self, id: CardId) -> Result<Option<CreditCard>, LedgerError> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Get all cards owned by a user
    pub fn get_by_owner(&self, owner: UserId) -> Result<Vec<CreditCard>, LedgerError> {
        let data = read_lock(&self.data)?;
        let by_owner = read_lock(&self.by_owner)?;

        let ids = by_owner.get(&owner).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut cards: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(cards)
    }

    /// Virtual cards linked to a physical parent
    pub fn get_virtual_cards(&self, parent: CardId) -> Result<Vec<CreditCard>, LedgerError> {
        let data = read_lock(&self.data)?;
        Ok(data
            .values()
            .filter(|c| c.parent_card_id == Some(parent))
            .cloned()
            .collect())
    }

    /// Insert or update a card
    pub fn upsert(&self, card: CreditCard) -> Result<(), LedgerError> {
        let mut data = write_lock(&self.data)?;
        let mut by_owner = write_lock(&self.by_owner)?;

        if let Some(old) = data.get(&card.id) {
            if let Some(ids) = by_owner.get_mut(&old.owner) {
                ids.retain(|&id| id != card.id);
            }
        }

        by_owner.entry(card.owner).or_default().push(card.id);
        data.insert(card.id, card);
        Ok(())
    }

    /// Number of cards
    pub fn count(&self) -> Result<usize, LedgerError> {
        Ok(read_lock(&self.data)?.len())
    }
}

pub(super) fn read_lock<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockReadGuard<'_, T>, LedgerError> {
    lock.read()
        .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(super) fn write_lock<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockWriteGuard<'_, T>, LedgerError> {
    lock.write()
        .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))
}

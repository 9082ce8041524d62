//! Trusted contact repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{ContactId, TrustedContact, UserId};

use super::cards::{read_lock, write_lock};
use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ContactData {
    contacts: Vec<TrustedContact>,
}

/// Repository for trusted contact persistence
pub struct ContactRepository {
    path: PathBuf,
    data: RwLock<HashMap<ContactId, TrustedContact>>,
    /// Index: owner -> contact ids
    by_owner: RwLock<HashMap<UserId, Vec<ContactId>>>,
}

impl ContactRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_owner: RwLock::new(HashMap::new()),
        }
    }

    /// Load contacts from disk and rebuild the owner index
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: ContactData = read_json(&self.path)?;

        let mut data = write_lock(&self.data)?;
        let mut by_owner = write_lock(&self.by_owner)?;

        data.clear();
        by_owner.clear();

        for contact in file_data.contacts {
            by_owner.entry(contact.owner).or_default().push(contact.id);
            data.insert(contact.id, contact);
        }

        Ok(())
    }

    /// Save contacts to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let data = read_lock(&self.data)?;

        let mut contacts: Vec<_> = data.values().cloned().collect();
        contacts.sort_by(|a, b| a.name.cmp(&b.name));

        write_json_atomic(&self.path, &ContactData { contacts })
    }

    /// Get a contact by ID
    pub fn get(&self, id: ContactId) -> Result<Option<TrustedContact>, LedgerError> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Get all contacts owned by a user, sorted by name
    pub fn get_by_owner(&self, owner: UserId) -> Result<Vec<TrustedContact>, LedgerError> {
        let data = read_lock(&self.data)?;
        let by_owner = read_lock(&self.by_owner)?;

        let ids = by_owner.get(&owner).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut contacts: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        contacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(contacts)
    }

    /// Insert or update a contact
    pub fn upsert(&self, contact: TrustedContact) -> Result<(), LedgerError> {
        let mut data = write_lock(&self.data)?;
        let mut by_owner = write_lock(&self.by_owner)?;

        if let Some(old) = data.get(&contact.id) {
            if let Some(ids) = by_owner.get_mut(&old.owner) {
                ids.retain(|&id| id != contact.id);
            }
        }

        by_owner.entry(contact.owner).or_default().push(contact.id);
        data.insert(contact.id, contact);
        Ok(())
    }

    /// Delete a contact
    pub fn delete(&self, id: ContactId) -> Result<bool, LedgerError> {
        let mut data = write_lock(&self.data)?;
        let mut by_owner = write_lock(&self.by_owner)?;

        match data.remove(&id) {
            Some(old) => {
                if let Some(ids) = by_owner.get_mut(&old.owner) {
                    ids.retain(|&i| i != id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

//! Merchant rule repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{MerchantCategoryRule, RuleId, UserId};

use super::cards::{read_lock, write_lock};
use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RuleData {
    rules: Vec<MerchantCategoryRule>,
}

/// Repository for merchant category rules
///
/// Rule lookup during import is per user and per normalized merchant key,
/// so that pair is kept as a secondary index.
pub struct RuleRepository {
    path: PathBuf,
    data: RwLock<HashMap<RuleId, MerchantCategoryRule>>,
    /// Index: (user, merchant key) -> rule id
    by_user_key: RwLock<HashMap<(UserId, String), RuleId>>,
}

impl RuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_user_key: RwLock::new(HashMap::new()),
        }
    }

    /// Load rules from disk and rebuild the lookup index
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: RuleData = read_json(&self.path)?;

        let mut data = write_lock(&self.data)?;
        let mut by_user_key = write_lock(&self.by_user_key)?;

        data.clear();
        by_user_key.clear();

        for rule in file_data.rules {
            by_user_key.insert((rule.user_id, rule.merchant_key.clone()), rule.id);
            data.insert(rule.id, rule);
        }

        Ok(())
    }

    /// Save rules to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let data = read_lock(&self.data)?;

        let mut rules: Vec<_> = data.values().cloned().collect();
        rules.sort_by(|a, b| a.merchant_key.cmp(&b.merchant_key));

        write_json_atomic(&self.path, &RuleData { rules })
    }

    /// Get a rule by ID
    pub fn get(&self, id: RuleId) -> Result<Option<MerchantCategoryRule>, LedgerError> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// The rule for one user and normalized merchant key, if one exists
    pub fn find_by_user_key(
        &self,
        user_id: UserId,
        merchant_key: &str,
    ) -> Result<Option<MerchantCategoryRule>, LedgerError> {
        let data = read_lock(&self.data)?;
        let by_user_key = read_lock(&self.by_user_key)?;

        Ok(by_user_key
            .get(&(user_id, merchant_key.to_string()))
            .and_then(|id| data.get(id))
            .cloned())
    }

    /// All rules for one user, sorted by merchant key
    pub fn get_by_user(&self, user_id: UserId) -> Result<Vec<MerchantCategoryRule>, LedgerError> {
        let data = read_lock(&self.data)?;
        let mut rules: Vec<_> = data
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.merchant_key.cmp(&b.merchant_key));
        Ok(rules)
    }

    /// Insert or update a rule
    pub fn upsert(&self, rule: MerchantCategoryRule) -> Result<(), LedgerError> {
        let mut data = write_lock(&self.data)?;
        let mut by_user_key = write_lock(&self.by_user_key)?;

        if let Some(old) = data.get(&rule.id) {
            by_user_key.remove(&(old.user_id, old.merchant_key.clone()));
        }

        by_user_key.insert((rule.user_id, rule.merchant_key.clone()), rule.id);
        data.insert(rule.id, rule);
        Ok(())
    }

    /// Delete a rule
    pub fn delete(&self, id: RuleId) -> Result<bool, LedgerError> {
        let mut data = write_lock(&self.data)?;
        let mut by_user_key = write_lock(&self.by_user_key)?;

        match data.remove(&id) {
            Some(old) => {
                by_user_key.remove(&(old.user_id, old.merchant_key));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of rules
    pub fn count(&self) -> Result<usize, LedgerError> {
        Ok(read_lock(&self.data)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryId;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, RuleRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = RuleRepository::new(temp_dir.path().join("merchant_rules.json"));
        repo.load().unwrap();
        (temp_dir, repo)
    }

    #[test]
    fn test_find_by_user_key() {
        let (_temp, repo) = create_test_repo();
        let user = UserId::new();
        let rule = MerchantCategoryRule::new(user, "UBER TRIP", None, CategoryId::new()).unwrap();

        repo.upsert(rule).unwrap();

        assert!(repo.find_by_user_key(user, "UBER TRIP").unwrap().is_some());
        assert!(repo.find_by_user_key(user, "IFOOD").unwrap().is_none());
        assert!(repo
            .find_by_user_key(UserId::new(), "UBER TRIP")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_upsert_moves_index_on_key_change() {
        let (_temp, repo) = create_test_repo();
        let user = UserId::new();
        let mut rule = MerchantCategoryRule::new(user, "UBER", None, CategoryId::new()).unwrap();
        repo.upsert(rule.clone()).unwrap();

        rule.merchant_key = "UBER TRIP".to_string();
        repo.upsert(rule).unwrap();

        assert!(repo.find_by_user_key(user, "UBER").unwrap().is_none());
        assert!(repo.find_by_user_key(user, "UBER TRIP").unwrap().is_some());
    }

    #[test]
    fn test_get_by_user_sorted() {
        let (_temp, repo) = create_test_repo();
        let user = UserId::new();

        repo.upsert(MerchantCategoryRule::new(user, "UBER", None, CategoryId::new()).unwrap())
            .unwrap();
        repo.upsert(MerchantCategoryRule::new(user, "IFOOD", None, CategoryId::new()).unwrap())
            .unwrap();

        let rules = repo.get_by_user(user).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].merchant_key, "IFOOD");
    }

    #[test]
    fn test_save_and_reload() {
        let (temp, repo) = create_test_repo();
        let user = UserId::new();
        let rule = MerchantCategoryRule::new(user, "UBER", None, CategoryId::new()).unwrap();

        repo.upsert(rule).unwrap();
        repo.save().unwrap();

        let repo2 = RuleRepository::new(temp.path().join("merchant_rules.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.count().unwrap(), 1);
        assert!(repo2.find_by_user_key(user, "UBER").unwrap().is_some());
    }
}

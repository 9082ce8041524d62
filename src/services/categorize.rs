//! Merchant auto-categorization service
//!
//! Learns per-user category rules from confirmations and overrides, and
//! applies them to invoice items when the confidence gate allows it.

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    normalize_merchant_key, CategoryId, InvoiceId, ItemId, MerchantCategoryRule, UserId,
};
use crate::storage::Storage;

/// What the rule engine proposes for a merchant description
#[derive(Debug, Clone)]
pub struct CategorySuggestion {
    pub rule_id: crate::models::RuleId,
    pub category_id: CategoryId,
    pub confidence: f64,
    /// Whether the rule clears the auto-apply gate
    pub auto_apply: bool,
}

/// Service for merchant category rules
pub struct CategorizeService<'a> {
    storage: &'a Storage,
}

impl<'a> CategorizeService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Look up the learned rule for a merchant description
    ///
    /// Returns None when no rule exists for the normalized key (including
    /// descriptions that normalize to nothing, like bare store numbers).
    pub fn suggest(
        &self,
        user_id: UserId,
        description: &str,
    ) -> LedgerResult<Option<CategorySuggestion>> {
        let key = normalize_merchant_key(description);
        if key.is_empty() {
            return Ok(None);
        }

        let rule = self.storage.rules.find_by_user_key(user_id, &key)?;
        Ok(rule.map(|r| CategorySuggestion {
            rule_id: r.id,
            category_id: r.category_id,
            confidence: r.confidence_score(),
            auto_apply: r.should_auto_apply(),
        }))
    }

    /// Apply the learned rule to an invoice item, if the gate allows
    ///
    /// Returns the suggestion that was applied, or None when no rule
    /// matched or the rule is below the auto-apply threshold. Application
    /// bumps the rule's usage counter but not its confidence.
    pub fn apply_to_item(
        &self,
        user_id: UserId,
        invoice_id: InvoiceId,
        item_id: ItemId,
    ) -> LedgerResult<Option<CategorySuggestion>> {
        let mut invoice = self
            .storage
            .invoices
            .get(invoice_id)?
            .ok_or_else(|| LedgerError::invoice_not_found(invoice_id.to_string()))?;

        let description = invoice
            .item(item_id)
            .map(|i| i.description.clone())
            .ok_or_else(|| LedgerError::item_not_found(item_id.to_string()))?;

        let suggestion = match self.suggest(user_id, &description)? {
            Some(s) if s.auto_apply => s,
            _ => return Ok(None),
        };

        if let Some(item) = invoice.item_mut(item_id) {
            item.set_category(suggestion.category_id);
        }

        let mut rule = self
            .storage
            .rules
            .get(suggestion.rule_id)?
            .ok_or_else(|| LedgerError::rule_not_found(suggestion.rule_id.to_string()))?;
        let before = rule.clone();
        rule.record_application();

        self.storage.invoices.upsert(invoice)?;
        self.storage.invoices.save()?;
        self.storage.rules.upsert(rule.clone())?;
        self.storage.rules.save()?;
        self.storage.log_update(
            EntityType::MerchantRule,
            rule.id.to_string(),
            Some(rule.merchant_key.clone()),
            &before,
            &rule,
            Some("applied".to_string()),
        )?;

        Ok(Some(suggestion))
    }

    /// The user confirmed a category for a merchant description
    ///
    /// Creates the rule on first confirmation. Confirming the rule's
    /// current category strengthens it; confirming a different one counts
    /// as an override, which switches the rule's category and resets its
    /// confirmation count against the new one.
    pub fn confirm_category(
        &self,
        user_id: UserId,
        description: &str,
        category_id: CategoryId,
    ) -> LedgerResult<MerchantCategoryRule> {
        if self.storage.categories.get(category_id)?.is_none() {
            return Err(LedgerError::category_not_found(category_id.to_string()));
        }

        let key = normalize_merchant_key(description);
        if key.is_empty() {
            return Err(LedgerError::Validation(format!(
                "Description '{}' normalizes to an empty merchant key",
                description
            )));
        }

        match self.storage.rules.find_by_user_key(user_id, &key)? {
            Some(mut rule) => {
                let before = rule.clone();
                let summary = if rule.category_id == category_id {
                    rule.record_confirmation();
                    "confirmed"
                } else {
                    rule.record_override(category_id);
                    "overridden"
                };

                self.storage.rules.upsert(rule.clone())?;
                self.storage.rules.save()?;
                self.storage.log_update(
                    EntityType::MerchantRule,
                    rule.id.to_string(),
                    Some(rule.merchant_key.clone()),
                    &before,
                    &rule,
                    Some(summary.to_string()),
                )?;
                Ok(rule)
            }
            None => {
                let rule = MerchantCategoryRule::new(
                    user_id,
                    key,
                    Some(description.to_string()),
                    category_id,
                )
                .map_err(|e| LedgerError::Validation(e.to_string()))?;

                self.storage.rules.upsert(rule.clone())?;
                self.storage.rules.save()?;
                self.storage.log_create(
                    EntityType::MerchantRule,
                    rule.id.to_string(),
                    Some(rule.merchant_key.clone()),
                    &rule,
                )?;
                Ok(rule)
            }
        }
    }

    /// All rules learned for a user
    pub fn list_rules(&self, user_id: UserId) -> LedgerResult<Vec<MerchantCategoryRule>> {
        self.storage.rules.get_by_user(user_id)
    }
}

//! Merchant category rule model
//!
//! Tracks, per user, which expense category a recurring merchant
//! description belongs to. Confidence is a plain ratio of confirmations to
//! overrides; the auto-apply gate is a separate boolean policy so the
//! threshold can change without touching the counting logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, RuleId, UserId};

/// Normalize a raw merchant description into a matching key
///
/// Uppercases, turns punctuation into spaces, drops all-digit tokens
/// (store numbers, authorization codes) and collapses whitespace, so
/// "Uber *Trip 8841" and "UBER*TRIP 0123" both map to "UBER TRIP".
pub fn normalize_merchant_key(description: &str) -> String {
    description
        .to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Policy gating automatic application of a learned rule
///
/// The default threshold means "at least one net confirmation": a rule is
/// eligible as soon as it has been confirmed once, and an override (which
/// resets the confirmation counter against the new category) keeps it
/// eligible at confidence 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoApplyPolicy {
    /// Minimum confidence score for auto-apply
    pub min_confidence: f64,
}

impl Default for AutoApplyPolicy {
    fn default() -> Self {
        Self { min_confidence: 0.5 }
    }
}

impl AutoApplyPolicy {
    /// Whether a rule with the given counters should auto-apply
    pub fn allows(&self, times_confirmed: u32, times_overridden: u32) -> bool {
        confidence_score(times_confirmed, times_overridden) >= self.min_confidence
            && times_confirmed >= times_overridden
    }
}

/// Confidence ratio for a confirmation/override counter pair
///
/// Returns 0 when there have been no interactions at all.
pub fn confidence_score(times_confirmed: u32, times_overridden: u32) -> f64 {
    let interactions = times_confirmed + times_overridden;
    if interactions == 0 {
        0.0
    } else {
        f64::from(times_confirmed) / f64::from(interactions)
    }
}

/// A per-user learned mapping from a merchant key to a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantCategoryRule {
    /// Unique identifier
    pub id: RuleId,

    /// The user this rule belongs to
    pub user_id: UserId,

    /// Normalized matching token; see [`normalize_merchant_key`]
    pub merchant_key: String,

    /// Raw description the rule was first learned from, for display
    pub original_description: Option<String>,

    /// Category currently associated with the merchant
    pub category_id: CategoryId,

    /// Times the user accepted this category for the merchant
    pub times_confirmed: u32,

    /// Times the user picked a different category
    pub times_overridden: u32,

    /// Times the rule was automatically applied to an imported item
    pub times_applied: u32,

    /// Cached auto-apply gate, recomputed on every confirmation/override
    pub auto_apply: bool,

    /// When the rule was created
    pub created_at: DateTime<Utc>,

    /// When the rule was last modified
    pub updated_at: DateTime<Utc>,
}

impl MerchantCategoryRule {
    /// Create a rule from a user's first confirmation
    ///
    /// Creation counts as the first confirmation, which already meets the
    /// default threshold, so the rule starts out auto-applying.
    pub fn new(
        user_id: UserId,
        merchant_key: impl Into<String>,
        original_description: Option<String>,
        category_id: CategoryId,
    ) -> Result<Self, RuleValidationError> {
        let merchant_key = merchant_key.into();
        if merchant_key.trim().is_empty() {
            return Err(RuleValidationError::BlankMerchantKey);
        }

        let now = Utc::now();
        Ok(Self {
            id: RuleId::new(),
            user_id,
            merchant_key,
            original_description,
            category_id,
            times_confirmed: 1,
            times_overridden: 0,
            times_applied: 0,
            auto_apply: AutoApplyPolicy::default().allows(1, 0),
            created_at: now,
            updated_at: now,
        })
    }

    /// Confidence that the current category is right, in [0, 1]
    pub fn confidence_score(&self) -> f64 {
        confidence_score(self.times_confirmed, self.times_overridden)
    }

    /// The user accepted the current category again
    pub fn record_confirmation(&mut self) {
        self.times_confirmed += 1;
        self.recompute_auto_apply();
        self.updated_at = Utc::now();
    }

    /// The user picked a different category for this merchant
    ///
    /// The override counts as a first confirmation of the new category, so
    /// the confirmation counter resets to 1 rather than 0.
    pub fn record_override(&mut self, new_category: CategoryId) {
        self.category_id = new_category;
        self.times_confirmed = 1;
        self.times_overridden += 1;
        self.recompute_auto_apply();
        self.updated_at = Utc::now();
    }

    /// The rule was consulted and applied to an imported item
    ///
    /// Application is informational only and does not affect confidence.
    pub fn record_application(&mut self) {
        self.times_applied += 1;
        self.updated_at = Utc::now();
    }

    /// Whether the rule should be applied automatically
    ///
    /// Recomputed from the counters on every call; the stored `auto_apply`
    /// field is a serialized convenience and is not consulted, so a
    /// hand-edited data file cannot present a stale gate.
    pub fn should_auto_apply(&self) -> bool {
        AutoApplyPolicy::default().allows(self.times_confirmed, self.times_overridden)
    }

    fn recompute_auto_apply(&mut self) {
        self.auto_apply =
            AutoApplyPolicy::default().allows(self.times_confirmed, self.times_overridden);
    }
}

impl fmt::Display for MerchantCategoryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({:.0}%)",
            self.merchant_key,
            self.category_id,
            self.confidence_score() * 100.0
        )
    }
}

/// Validation errors for merchant rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    BlankMerchantKey,
}

impl fmt::Display for RuleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankMerchantKey => write!(f, "Merchant key cannot be blank"),
        }
    }
}

impl std::error::Error for RuleValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rule() -> MerchantCategoryRule {
        MerchantCategoryRule::new(UserId::new(), "UBER", None, CategoryId::new()).unwrap()
    }

    #[test]
    fn test_normalize_merchant_key() {
        assert_eq!(normalize_merchant_key("Uber *Trip 8841"), "UBER TRIP");
        assert_eq!(normalize_merchant_key("UBER*TRIP 0123"), "UBER TRIP");
        assert_eq!(normalize_merchant_key("  ifood  *IFD "), "IFOOD IFD");
        assert_eq!(normalize_merchant_key("PAG*JoseSilva"), "PAG JOSESILVA");
        assert_eq!(normalize_merchant_key("1234 5678"), "");
    }

    #[test]
    fn test_creation_counts_as_first_confirmation() {
        let rule = test_rule();
        assert_eq!(rule.times_confirmed, 1);
        assert_eq!(rule.times_overridden, 0);
        assert_eq!(rule.times_applied, 0);
        assert!(rule.auto_apply);
        assert!(rule.should_auto_apply());
        assert_eq!(rule.confidence_score(), 1.0);
    }

    #[test]
    fn test_blank_key_rejected() {
        let result = MerchantCategoryRule::new(UserId::new(), "  ", None, CategoryId::new());
        assert_eq!(result.unwrap_err(), RuleValidationError::BlankMerchantKey);
    }

    #[test]
    fn test_confirmation_keeps_full_confidence() {
        let mut rule = test_rule();
        rule.record_confirmation();
        rule.record_confirmation();
        assert_eq!(rule.times_confirmed, 3);
        assert_eq!(rule.confidence_score(), 1.0);
        assert!(rule.auto_apply);
    }

    #[test]
    fn test_override_resets_confirmations() {
        // Override switches category, resets confirmed to 1, increments
        // overridden, and under the default threshold stays auto-applying.
        let mut rule = test_rule();
        rule.record_confirmation();
        rule.record_confirmation();

        let new_category = CategoryId::new();
        rule.record_override(new_category);

        assert_eq!(rule.category_id, new_category);
        assert_eq!(rule.times_confirmed, 1);
        assert_eq!(rule.times_overridden, 1);
        assert_eq!(rule.confidence_score(), 0.5);
        assert!(rule.auto_apply);
        assert!(rule.should_auto_apply());
    }

    #[test]
    fn test_repeated_overrides_lower_confidence() {
        let mut rule = test_rule();
        rule.record_override(CategoryId::new());
        rule.record_override(CategoryId::new());

        assert_eq!(rule.times_overridden, 2);
        assert_eq!(rule.times_confirmed, 1);
        assert!(rule.confidence_score() < 0.5);
        assert!(!rule.auto_apply);
        assert!(!rule.should_auto_apply());
    }

    #[test]
    fn test_application_does_not_affect_confidence() {
        let mut rule = test_rule();
        let before = rule.confidence_score();
        rule.record_application();
        rule.record_application();
        assert_eq!(rule.times_applied, 2);
        assert_eq!(rule.confidence_score(), before);
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(confidence_score(0, 0), 0.0);
        assert_eq!(confidence_score(5, 0), 1.0);
        assert_eq!(confidence_score(1, 3), 0.25);

        for confirmed in 0..10u32 {
            for overridden in 0..10u32 {
                let score = confidence_score(confirmed, overridden);
                assert!((0.0..=1.0).contains(&score));
                if overridden == 0 && confirmed > 0 {
                    assert_eq!(score, 1.0);
                }
            }
        }
    }

    #[test]
    fn test_serialization() {
        let rule = test_rule();
        let json = serde_json::to_string(&rule).unwrap();
        let back: MerchantCategoryRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, rule.id);
        assert_eq!(back.merchant_key, rule.merchant_key);
        assert_eq!(back.times_confirmed, 1);
    }
}

//! Statement import service
//!
//! Parses a CSV card statement into invoice items, skipping rows already
//! imported (matched by a content hash) and auto-categorizing new items
//! through the merchant rule engine.

use std::io::Read;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::audit::{AuditEntry, EntityType};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{normalize_merchant_key, InvoiceId, InvoiceItem, Money, UserId};
use crate::storage::Storage;

/// One row of a CSV statement
///
/// Expected columns: `date` (YYYY-MM-DD), `description`, `amount`
/// (decimal, negative for credits), and optional `installment` /
/// `total_installments`.
#[derive(Debug, Deserialize)]
struct StatementRow {
    date: String,
    description: String,
    amount: String,
    #[serde(default)]
    installment: Option<u32>,
    #[serde(default)]
    total_installments: Option<u32>,
}

/// Import behavior switches
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Run the merchant rule engine on newly imported items
    pub auto_categorize: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            auto_categorize: true,
        }
    }
}

/// Outcome of one statement import
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Items added to the invoice
    pub imported: usize,
    /// Rows skipped because an identical item was already on the invoice
    pub duplicates: usize,
    /// Imported items that received a category from a learned rule
    pub auto_categorized: usize,
    /// Rows that failed to parse, with their line numbers
    pub errors: Vec<String>,
}

/// Service for importing card statements
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Import a CSV statement into an invoice
    ///
    /// Malformed rows are reported, not fatal: the rest of the statement
    /// still imports. The invoice is persisted once at the end.
    pub fn import_csv<R: Read>(
        &self,
        user_id: UserId,
        invoice_id: InvoiceId,
        reader: R,
        options: ImportOptions,
    ) -> LedgerResult<ImportReport> {
        let mut invoice = self
            .storage
            .invoices
            .get(invoice_id)?
            .ok_or_else(|| LedgerError::invoice_not_found(invoice_id.to_string()))?;

        let mut existing_ids: std::collections::HashSet<String> = invoice
            .items
            .iter()
            .filter_map(|i| i.import_id.clone())
            .collect();

        let mut report = ImportReport::default();
        let mut entries = Vec::new();
        let mut csv_reader = csv::Reader::from_reader(reader);
        let today = Utc::now().date_naive();

        for (idx, result) in csv_reader.deserialize::<StatementRow>().enumerate() {
            // Header is line 1
            let line = idx + 2;

            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    report.errors.push(format!("line {}: {}", line, e));
                    continue;
                }
            };

            let mut item = match parse_row(&row) {
                Ok(item) => item,
                Err(e) => {
                    report.errors.push(format!("line {}: {}", line, e));
                    continue;
                }
            };

            let import_id = item.generate_import_id();
            if !existing_ids.insert(import_id.clone()) {
                report.duplicates += 1;
                continue;
            }
            item.import_id = Some(import_id);

            if options.auto_categorize {
                if self.auto_categorize(user_id, &mut item)? {
                    report.auto_categorized += 1;
                }
            }

            entries.push(AuditEntry::create(
                EntityType::InvoiceItem,
                item.id.to_string(),
                Some(item.description.clone()),
                &item,
            ));
            invoice.add_item(item, today);
            report.imported += 1;
        }

        if report.imported > 0 {
            self.storage.invoices.upsert(invoice)?;
            self.storage.invoices.save()?;
            self.storage.rules.save()?;
            self.storage.log_batch(&entries)?;
        }

        Ok(report)
    }

    /// Apply a learned rule to a fresh item, if one clears the gate
    fn auto_categorize(&self, user_id: UserId, item: &mut InvoiceItem) -> LedgerResult<bool> {
        let key = normalize_merchant_key(&item.description);
        if key.is_empty() {
            return Ok(false);
        }

        let rule = match self.storage.rules.find_by_user_key(user_id, &key)? {
            Some(rule) if rule.should_auto_apply() => rule,
            _ => return Ok(false),
        };

        item.set_category(rule.category_id);

        let mut rule = rule;
        rule.record_application();
        self.storage.rules.upsert(rule)?;
        Ok(true)
    }
}

fn parse_row(row: &StatementRow) -> Result<InvoiceItem, String> {
    let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("bad date '{}': {}", row.date, e))?;

    let amount = Money::parse(&row.amount).map_err(|e| e.to_string())?;

    let item = match (row.installment, row.total_installments) {
        (Some(i), Some(t)) => {
            InvoiceItem::with_installments(row.description.trim(), amount, date, i, t)
        }
        _ => InvoiceItem::new(row.description.trim(), amount, date),
    };

    item.validate().map_err(|e| e.to_string())?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerPaths;
    use crate::models::{BillingMonth, CardId, Category, Invoice, MerchantCategoryRule};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(&paths).unwrap();
        (temp_dir, storage)
    }

    fn create_invoice(storage: &Storage) -> InvoiceId {
        let invoice = Invoice::new(
            CardId::new(),
            BillingMonth::new(2099, 1).unwrap(),
            NaiveDate::from_ymd_opt(2099, 1, 10).unwrap(),
        );
        let id = invoice.id;
        storage.invoices.upsert(invoice).unwrap();
        id
    }

    const STATEMENT: &str = "\
date,description,amount,installment,total_installments
2099-01-03,Uber *Trip 8841,42.00,,
2099-01-04,PADARIA DO ZE,-12.50,,
2099-01-05,MAGAZINE TV,250.00,3,12
";

    #[test]
    fn test_import_statement() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let invoice_id = create_invoice(&storage);

        let report = service
            .import_csv(
                UserId::new(),
                invoice_id,
                STATEMENT.as_bytes(),
                ImportOptions::default(),
            )
            .unwrap();

        assert_eq!(report.imported, 3);
        assert_eq!(report.duplicates, 0);
        assert!(report.errors.is_empty());

        let invoice = storage.invoices.get(invoice_id).unwrap().unwrap();
        assert_eq!(invoice.items.len(), 3);
        // 42.00 - 12.50 + 250.00
        assert_eq!(invoice.total, Money::from_cents(27950));

        let tv = &invoice.items[2];
        assert_eq!(tv.installment, 3);
        assert_eq!(tv.total_installments, 12);
        assert!(tv.import_id.is_some());
    }

    #[test]
    fn test_reimport_skips_duplicates() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let invoice_id = create_invoice(&storage);
        let user = UserId::new();

        service
            .import_csv(user, invoice_id, STATEMENT.as_bytes(), ImportOptions::default())
            .unwrap();
        let report = service
            .import_csv(user, invoice_id, STATEMENT.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(report.imported, 0);
        assert_eq!(report.duplicates, 3);

        let invoice = storage.invoices.get(invoice_id).unwrap().unwrap();
        assert_eq!(invoice.items.len(), 3);
    }

    #[test]
    fn test_bad_rows_reported_not_fatal() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let invoice_id = create_invoice(&storage);

        let csv = "\
date,description,amount,installment,total_installments
not-a-date,Shop,10.00,,
2099-01-03,Shop,abc,,
2099-01-04,Cafe,1.€,,
2099-01-05,Good Row,10.00,,
";
        let report = service
            .import_csv(
                UserId::new(),
                invoice_id,
                csv.as_bytes(),
                ImportOptions::default(),
            )
            .unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[0].starts_with("line 2:"));
        // A multibyte fractional part is an ordinary bad row
        assert!(report.errors[2].starts_with("line 4:"));
    }

    #[test]
    fn test_import_auto_categorizes() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let invoice_id = create_invoice(&storage);
        let user = UserId::new();

        let transport = Category::new("Transport", "#3366ff");
        let category_id = transport.id;
        storage.categories.upsert(transport).unwrap();
        let rule =
            MerchantCategoryRule::new(user, "UBER TRIP", None, category_id).unwrap();
        let rule_id = rule.id;
        storage.rules.upsert(rule).unwrap();

        let report = service
            .import_csv(user, invoice_id, STATEMENT.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(report.auto_categorized, 1);

        let invoice = storage.invoices.get(invoice_id).unwrap().unwrap();
        assert_eq!(invoice.items[0].category_id, Some(category_id));
        assert!(invoice.items[1].category_id.is_none());

        let rule = storage.rules.get(rule_id).unwrap().unwrap();
        assert_eq!(rule.times_applied, 1);
    }

    #[test]
    fn test_auto_categorize_disabled() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let invoice_id = create_invoice(&storage);
        let user = UserId::new();

        let transport = Category::new("Transport", "#3366ff");
        let category_id = transport.id;
        storage.categories.upsert(transport).unwrap();
        storage
            .rules
            .upsert(MerchantCategoryRule::new(user, "UBER TRIP", None, category_id).unwrap())
            .unwrap();

        let report = service
            .import_csv(
                user,
                invoice_id,
                STATEMENT.as_bytes(),
                ImportOptions {
                    auto_categorize: false,
                },
            )
            .unwrap();

        assert_eq!(report.auto_categorized, 0);
        let invoice = storage.invoices.get(invoice_id).unwrap().unwrap();
        assert!(invoice.items[0].category_id.is_none());
    }

    #[test]
    fn test_import_into_missing_invoice() {
        let (_temp, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let result = service.import_csv(
            UserId::new(),
            InvoiceId::new(),
            STATEMENT.as_bytes(),
            ImportOptions::default(),
        );
        assert!(result.unwrap_err().is_not_found());
    }
}

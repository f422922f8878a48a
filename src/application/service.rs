use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{
    Cents, EntryDate, Ledger, MAX_AMOUNT_CENTS, Transaction, TransactionType, YearMonth,
    compute_balance, format_cents, running_balances, sort_by_date, total_for_type,
    totals_by_category, transactions_in_month,
};
use crate::storage::Repository;

use super::{AppError, BalancePoint, BalanceSummary, CategoryReport, CategorySummary, MonthlySummary};

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, form UI, etc.).
///
/// The ledger is loaded once when the service is opened and written back
/// after every mutation.
pub struct LedgerService {
    repo: Repository,
    ledger: Ledger,
}

/// Fields of a transaction to record. Blank category or note fall back to
/// the transaction type's defaults.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub amount_cents: Cents,
    pub date: EntryDate,
    pub category: Option<String>,
    pub note: Option<String>,
}

impl LedgerService {
    pub fn new(repo: Repository, ledger: Ledger) -> Self {
        Self { repo, ledger }
    }

    /// Open the ledger stored at `path`. A missing or corrupted file yields
    /// an empty ledger (see `Repository::load`).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let repo = Repository::new(path);
        let ledger = repo.load();
        Self::new(repo, ledger)
    }

    /// Open the ledger stored at `path`, reporting a corrupted file instead
    /// of discarding it.
    pub fn open_strict(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let repo = Repository::new(path);
        let ledger = repo
            .read()
            .map_err(|e| AppError::CorruptStorage {
                path: repo.path().to_path_buf(),
                reason: format!("{:#}", e),
            })?
            .unwrap_or_default();
        Ok(Self::new(repo, ledger))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn data_path(&self) -> &Path {
        self.repo.path()
    }

    /// Apply `change` to a copy of the ledger, persist it, and only then make
    /// it current. A failed save leaves memory and disk unchanged.
    fn commit<F>(&mut self, change: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Ledger),
    {
        let mut next = self.ledger.clone();
        change(&mut next);
        self.repo.save(&next)?;
        self.ledger = next;
        Ok(())
    }

    // ========================
    // Mutations
    // ========================

    /// Replace the starting balance. Zero and negatives are accepted; the
    /// magnitude is capped at `MAX_AMOUNT_CENTS`.
    pub fn set_starting_balance(&mut self, amount_cents: Cents) -> Result<(), AppError> {
        if amount_cents.unsigned_abs() > MAX_AMOUNT_CENTS.unsigned_abs() {
            return Err(AppError::InvalidAmount(format!(
                "starting balance {} exceeds the limit of {}",
                format_cents(amount_cents),
                format_cents(MAX_AMOUNT_CENTS)
            )));
        }
        self.commit(|ledger| ledger.starting_balance = amount_cents)
    }

    /// Append a transaction. Identical entries may be recorded any number of
    /// times.
    pub fn record_transaction(&mut self, new: NewTransaction) -> Result<Transaction, AppError> {
        let mut transaction = Transaction::new(new.kind, new.amount_cents, new.date)?;
        if let Some(category) = new.category {
            transaction = transaction.with_category(category);
        }
        if let Some(note) = new.note {
            transaction = transaction.with_note(note);
        }

        let recorded = transaction.clone();
        self.commit(|ledger| ledger.transactions.push(transaction))?;
        Ok(recorded)
    }

    /// Record money received.
    pub fn add_income(
        &mut self,
        amount_cents: Cents,
        date: EntryDate,
        source: Option<String>,
        note: Option<String>,
    ) -> Result<Transaction, AppError> {
        self.record_transaction(NewTransaction {
            kind: TransactionType::In,
            amount_cents,
            date,
            category: source,
            note,
        })
    }

    /// Record money spent.
    pub fn add_expense(
        &mut self,
        amount_cents: Cents,
        date: EntryDate,
        category: Option<String>,
        note: Option<String>,
    ) -> Result<Transaction, AppError> {
        self.record_transaction(NewTransaction {
            kind: TransactionType::Out,
            amount_cents,
            date,
            category,
            note,
        })
    }

    /// Replace every transaction at once, keeping the starting balance.
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) -> Result<(), AppError> {
        let count = transactions.len();
        self.commit(|ledger| ledger.transactions = transactions)?;
        info!(count, "Replaced all transactions");
        Ok(())
    }

    /// Remove all transactions, keeping the starting balance.
    pub fn reset(&mut self) -> Result<usize, AppError> {
        let removed = self.ledger.transactions.len();
        self.commit(|ledger| ledger.transactions.clear())?;
        info!(removed, "Cleared all transactions");
        Ok(removed)
    }

    // ========================
    // Queries
    // ========================

    pub fn compute_balance(&self) -> Cents {
        compute_balance(self.ledger.starting_balance, &self.ledger.transactions)
    }

    pub fn balance_summary(&self) -> BalanceSummary {
        let transactions = &self.ledger.transactions;
        BalanceSummary {
            balance: self.compute_balance(),
            starting_balance: self.ledger.starting_balance,
            total_income: total_for_type(transactions, TransactionType::In),
            total_expense: total_for_type(transactions, TransactionType::Out),
            transaction_count: transactions.len(),
        }
    }

    /// All transactions, oldest first.
    pub fn list_transactions(&self) -> Vec<Transaction> {
        sort_by_date(&self.ledger.transactions)
    }

    /// Totals for one calendar month. Fails with `InvalidDate` when
    /// `year`/`month` do not name a real month.
    pub fn monthly_summary(&self, year: i32, month: u32) -> Result<MonthlySummary, AppError> {
        let month = YearMonth::new(year, month)?;
        Ok(self.monthly_summary_for(month))
    }

    pub fn monthly_summary_for(&self, month: YearMonth) -> MonthlySummary {
        let transactions = transactions_in_month(&self.ledger.transactions, month);
        let total_income = total_for_type(&transactions, TransactionType::In);
        let total_expense = total_for_type(&transactions, TransactionType::Out);

        MonthlySummary {
            month,
            total_income,
            total_expense,
            net: total_income.saturating_sub(total_expense),
            count: transactions.len(),
            transactions,
        }
    }

    /// Totals per category for one transaction type, largest first.
    pub fn category_report(&self, kind: TransactionType) -> CategoryReport {
        let totals = totals_by_category(&self.ledger.transactions, kind);
        let total = totals
            .values()
            .fold(0, |total: Cents, (amount, _)| total.saturating_add(*amount));

        let mut categories: Vec<CategorySummary> = totals
            .into_iter()
            .map(|(category, (amount, count))| CategorySummary {
                category,
                total: amount,
                count,
                percentage: if total > 0 {
                    (amount as f64 / total as f64) * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

        CategoryReport {
            kind,
            categories,
            total,
        }
    }

    /// Balance after each transaction, in date order.
    pub fn balance_timeline(&self) -> Vec<BalancePoint> {
        running_balances(self.ledger.starting_balance, &self.ledger.transactions)
            .into_iter()
            .map(|(date, balance)| BalancePoint { date, balance })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> EntryDate {
        EntryDate::parse(s).unwrap()
    }

    fn open_temp() -> (LedgerService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = LedgerService::open(temp_dir.path().join("pocket.json"));
        (service, temp_dir)
    }

    #[test]
    fn test_record_persists_immediately() {
        let (mut service, temp) = open_temp();

        service
            .add_income(5000, date("2024-01-05"), Some("gift".into()), None)
            .unwrap();

        let reopened = LedgerService::open(temp.path().join("pocket.json"));
        assert_eq!(reopened.ledger(), service.ledger());
        assert_eq!(reopened.compute_balance(), 5000);
    }

    #[test]
    fn test_defaults_applied_for_blank_fields() {
        let (mut service, _temp) = open_temp();

        let income = service
            .add_income(100, date("2024-01-05"), Some("  ".into()), None)
            .unwrap();
        let expense = service
            .add_expense(100, date("2024-01-05"), None, Some("".into()))
            .unwrap();

        assert_eq!(income.category, "Pocket Money");
        assert_eq!(expense.category, "Other");
        assert_eq!(expense.note, "");
    }

    #[test]
    fn test_non_positive_amount_rejected_without_saving() {
        let (mut service, temp) = open_temp();

        let result = service.add_expense(0, date("2024-01-05"), None, None);
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
        assert!(service.ledger().is_empty());
        assert!(!temp.path().join("pocket.json").exists());
    }

    #[test]
    fn test_amount_limit_enforced() {
        let (mut service, temp) = open_temp();

        let result = service.add_income(MAX_AMOUNT_CENTS + 1, date("2024-01-05"), None, None);
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
        assert!(matches!(
            service.set_starting_balance(-MAX_AMOUNT_CENTS - 1),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(!temp.path().join("pocket.json").exists());
    }

    #[test]
    fn test_round_trip_at_amount_limit() {
        let (mut service, temp) = open_temp();

        service.set_starting_balance(-MAX_AMOUNT_CENTS).unwrap();
        service
            .add_income(MAX_AMOUNT_CENTS, date("2024-01-05"), None, None)
            .unwrap();
        service
            .add_income(MAX_AMOUNT_CENTS - 7, date("2024-01-06"), None, None)
            .unwrap();
        service
            .add_expense(MAX_AMOUNT_CENTS, date("2024-01-07"), None, None)
            .unwrap();

        let reopened = LedgerService::open(temp.path().join("pocket.json"));
        assert_eq!(reopened.ledger(), service.ledger());
        assert_eq!(reopened.compute_balance(), -7);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = temp_dir.path().join("blocked");
        std::fs::create_dir_all(path.join("inner")).unwrap();
        let mut service = LedgerService::new(Repository::new(&path), Ledger::default());

        let result = service.add_income(100, date("2024-01-05"), None, None);
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert!(service.ledger().is_empty());
    }

    #[test]
    fn test_monthly_summary_rejects_invalid_month() {
        let (service, _temp) = open_temp();

        assert!(matches!(
            service.monthly_summary(2024, 13),
            Err(AppError::InvalidDate(_))
        ));
        assert!(matches!(
            service.monthly_summary(2024, 0),
            Err(AppError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_category_report_percentages() {
        let (mut service, _temp) = open_temp();
        service
            .add_expense(3000, date("2024-01-05"), Some("snacks".into()), None)
            .unwrap();
        service
            .add_expense(1000, date("2024-01-06"), Some("games".into()), None)
            .unwrap();
        service
            .add_income(9900, date("2024-01-06"), None, None)
            .unwrap();

        let report = service.category_report(TransactionType::Out);
        assert_eq!(report.total, 4000);
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].category, "snacks");
        assert!((report.categories[0].percentage - 75.0).abs() < f64::EPSILON);
        assert!((report.categories[1].percentage - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_category_report_empty() {
        let (service, _temp) = open_temp();
        let report = service.category_report(TransactionType::Out);
        assert_eq!(report.total, 0);
        assert!(report.categories.is_empty());
    }
}

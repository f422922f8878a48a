use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Cents, EntryDate, Transaction, TransactionType, YearMonth, decimal_amount};

/// The full record kept for one user: a starting balance plus every
/// transaction in the order it was recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default, with = "decimal_amount")]
    pub starting_balance: Cents,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(starting_balance: Cents) -> Self {
        Self {
            starting_balance,
            transactions: Vec::new(),
        }
    }

    pub fn balance(&self) -> Cents {
        compute_balance(self.starting_balance, &self.transactions)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Balance = starting balance + incoming amounts - outgoing amounts.
/// Sums saturate at the `Cents` range instead of overflowing.
pub fn compute_balance(starting_balance: Cents, transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .fold(starting_balance, |balance, t| {
            balance.saturating_add(t.signed_amount())
        })
}

/// Sum of amounts for one transaction type.
pub fn total_for_type(transactions: &[Transaction], kind: TransactionType) -> Cents {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .fold(0, |total: Cents, t| total.saturating_add(t.amount_cents))
}

/// Transactions ordered by date, oldest first. Entries sharing a date keep
/// the order they were recorded in.
pub fn sort_by_date(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|t| t.date);
    sorted
}

/// Transactions dated within `month`, oldest first.
pub fn transactions_in_month(transactions: &[Transaction], month: YearMonth) -> Vec<Transaction> {
    let in_month: Vec<Transaction> = transactions
        .iter()
        .filter(|t| month.contains(&t.date))
        .cloned()
        .collect();
    sort_by_date(&in_month)
}

/// Per-category total and entry count for one transaction type.
pub fn totals_by_category(
    transactions: &[Transaction],
    kind: TransactionType,
) -> BTreeMap<String, (Cents, usize)> {
    let mut totals: BTreeMap<String, (Cents, usize)> = BTreeMap::new();

    for t in transactions.iter().filter(|t| t.kind == kind) {
        let entry = totals.entry(t.category.clone()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(t.amount_cents);
        entry.1 += 1;
    }

    totals
}

/// Running balance after each transaction, in date order.
pub fn running_balances(
    starting_balance: Cents,
    transactions: &[Transaction],
) -> Vec<(EntryDate, Cents)> {
    let mut balance = starting_balance;
    sort_by_date(transactions)
        .into_iter()
        .map(|t| {
            balance = balance.saturating_add(t.signed_amount());
            (t.date, balance)
        })
        .collect()
}

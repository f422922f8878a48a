use serde::{Deserialize, Serialize};

use crate::domain::{Cents, EntryDate, Transaction, TransactionType, YearMonth};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub balance: Cents,
    pub starting_balance: Cents,
    pub total_income: Cents,
    pub total_expense: Cents,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total_income: Cents,
    pub total_expense: Cents,
    pub net: Cents,
    pub count: usize,
    /// Entries of the month, oldest first
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub kind: TransactionType,
    pub categories: Vec<CategorySummary>,
    pub total: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: EntryDate,
    pub balance: Cents,
}

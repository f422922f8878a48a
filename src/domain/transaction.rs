use serde::{Deserialize, Serialize};

use super::{Cents, EntryDate, MAX_AMOUNT_CENTS, decimal_amount};

/// Category given to income entered without one.
pub const DEFAULT_INCOME_CATEGORY: &str = "Pocket Money";
/// Category given to expenses entered without one.
pub const DEFAULT_EXPENSE_CATEGORY: &str = "Other";
/// Category given to imported rows whose category cell is blank.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money received
    #[serde(rename = "IN", alias = "Income (+)")]
    In,
    /// Money spent
    #[serde(rename = "OUT", alias = "Expense (-)")]
    Out,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
        }
    }

    /// Accepts the stored codes as well as the labels used by the form UI export.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in" | "income" | "income (+)" | "+" => Some(TransactionType::In),
            "out" | "expense" | "expense (-)" | "-" => Some(TransactionType::Out),
            _ => None,
        }
    }

    pub fn default_category(&self) -> &'static str {
        match self {
            TransactionType::In => DEFAULT_INCOME_CATEGORY,
            TransactionType::Out => DEFAULT_EXPENSE_CATEGORY,
        }
    }

    /// Apply this type's direction to an amount.
    pub fn signed(&self, amount_cents: Cents) -> Cents {
        match self {
            TransactionType::In => amount_cents,
            TransactionType::Out => -amount_cents,
        }
    }

    pub fn sign_symbol(&self) -> char {
        match self {
            TransactionType::In => '+',
            TransactionType::Out => '-',
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single income or expense entry. Entries are never edited once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: EntryDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount in cents (always positive when created through `new`)
    #[serde(rename = "amount", with = "decimal_amount")]
    pub amount_cents: Cents,
    /// Free-text label such as "Snacks" or "From Dad"
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub note: String,
}

impl Transaction {
    /// Create a new entry with the type's default category and an empty note.
    pub fn new(
        kind: TransactionType,
        amount_cents: Cents,
        date: EntryDate,
    ) -> Result<Self, TransactionError> {
        if amount_cents <= 0 {
            return Err(TransactionError::NonPositiveAmount(amount_cents));
        }
        if amount_cents > MAX_AMOUNT_CENTS {
            return Err(TransactionError::AmountTooLarge(amount_cents));
        }
        Ok(Self {
            date,
            kind,
            amount_cents,
            category: kind.default_category().to_string(),
            note: String::new(),
        })
    }

    /// Set the category. A blank value keeps the current one.
    pub fn with_category(mut self, category: impl AsRef<str>) -> Self {
        let category = category.as_ref().trim();
        if !category.is_empty() {
            self.category = category.to_string();
        }
        self
    }

    pub fn with_note(mut self, note: impl AsRef<str>) -> Self {
        self.note = note.as_ref().trim().to_string();
        self
    }

    /// Contribution of this entry to the balance.
    pub fn signed_amount(&self) -> Cents {
        self.kind.signed(self.amount_cents)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::In
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    NonPositiveAmount(Cents),
    AmountTooLarge(Cents),
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionError::NonPositiveAmount(cents) => write!(
                f,
                "Amount must be positive, got {}",
                super::format_cents(*cents)
            ),
            TransactionError::AmountTooLarge(cents) => write!(
                f,
                "Amount {} exceeds the limit of {}",
                super::format_cents(*cents),
                super::format_cents(MAX_AMOUNT_CENTS)
            ),
        }
    }
}

impl std::error::Error for TransactionError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> EntryDate {
        EntryDate::parse(s).unwrap()
    }

    #[test]
    fn test_create_transaction_with_defaults() {
        let income = Transaction::new(TransactionType::In, 5000, date("2024-01-05")).unwrap();
        assert_eq!(income.category, "Pocket Money");
        assert_eq!(income.note, "");
        assert_eq!(income.signed_amount(), 5000);
        assert!(income.is_income());

        let expense = Transaction::new(TransactionType::Out, 2000, date("2024-01-10")).unwrap();
        assert_eq!(expense.category, "Other");
        assert_eq!(expense.signed_amount(), -2000);
    }

    #[test]
    fn test_blank_category_keeps_default() {
        let expense = Transaction::new(TransactionType::Out, 100, date("2024-01-10"))
            .unwrap()
            .with_category("   ")
            .with_note("  popcorn ");

        assert_eq!(expense.category, "Other");
        assert_eq!(expense.note, "popcorn");

        let snacks = expense.with_category(" Snacks ");
        assert_eq!(snacks.category, "Snacks");
    }

    #[test]
    fn test_transaction_requires_positive_amount() {
        assert_eq!(
            Transaction::new(TransactionType::In, 0, date("2024-01-05")),
            Err(TransactionError::NonPositiveAmount(0))
        );
        assert!(Transaction::new(TransactionType::Out, -100, date("2024-01-05")).is_err());
    }

    #[test]
    fn test_transaction_amount_limit() {
        assert!(Transaction::new(TransactionType::In, MAX_AMOUNT_CENTS, date("2024-01-05")).is_ok());
        assert_eq!(
            Transaction::new(TransactionType::In, MAX_AMOUNT_CENTS + 1, date("2024-01-05")),
            Err(TransactionError::AmountTooLarge(MAX_AMOUNT_CENTS + 1))
        );
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!(TransactionType::from_str("IN"), Some(TransactionType::In));
        assert_eq!(TransactionType::from_str("out"), Some(TransactionType::Out));
        assert_eq!(
            TransactionType::from_str("Income (+)"),
            Some(TransactionType::In)
        );
        assert_eq!(
            TransactionType::from_str("Expense (-)"),
            Some(TransactionType::Out)
        );
        assert_eq!(TransactionType::from_str("transfer"), None);
    }

    #[test]
    fn test_json_layout() {
        let t = Transaction::new(TransactionType::In, 5050, date("2024-01-05"))
            .unwrap()
            .with_category("gift")
            .with_note("birthday");

        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2024-01-05",
                "type": "IN",
                "amount": 50.5,
                "category": "gift",
                "note": "birthday"
            })
        );
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let t: Transaction = serde_json::from_str(
            r#"{"date": "2024-01-05 18:30", "type": "OUT", "amount": 20.0}"#,
        )
        .unwrap();

        assert_eq!(t.kind, TransactionType::Out);
        assert_eq!(t.amount_cents, 2000);
        assert_eq!(t.category, "");
        assert_eq!(t.note, "");
    }
}

use std::io::Read;

use csv::StringRecord;
use tracing::info;

use crate::application::{AppError, LedgerService};
use crate::domain::{EntryDate, Transaction, TransactionType, UNCATEGORIZED, parse_cents};
use crate::io::export::CSV_COLUMNS;

/// Result of an import operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    /// Transactions that were in the ledger before and got replaced
    pub replaced: usize,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse and validate without touching the ledger
    pub dry_run: bool,
}

/// Importer for loading a transactions CSV into the ledger.
///
/// The imported rows become the ledger's complete transaction list; the
/// starting balance is kept.
pub struct Importer<'a> {
    service: &'a mut LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a mut LedgerService) -> Self {
        Self { service }
    }

    pub fn import_transactions_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        let transactions = parse_transactions_csv(reader)?;
        let imported = transactions.len();
        let replaced = self.service.ledger().transactions.len();

        if !options.dry_run {
            self.service.replace_transactions(transactions)?;
            info!(imported, replaced, "Imported transactions from CSV");
        }

        Ok(ImportResult { imported, replaced })
    }
}

/// Column positions of the required fields, matched by header name.
struct ColumnMap {
    date: usize,
    kind: usize,
    amount: usize,
    category: usize,
    note: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, AppError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = CSV_COLUMNS
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::MissingColumns(missing));
        }

        let [date, kind, amount, category, note] = CSV_COLUMNS.map(|name| position(name).unwrap_or(0));
        Ok(Self {
            date,
            kind,
            amount,
            category,
            note,
        })
    }
}

/// Parse a transactions CSV with the `Date, Type, Amount, Category, Note`
/// columns (any order, extra columns ignored). The first bad row aborts the
/// whole parse.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<Transaction>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AppError::InvalidRow {
            line: 1,
            reason: format!("CSV parse error: {}", e),
        })?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut transactions = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing

        let record = result.map_err(|e| AppError::InvalidRow {
            line,
            reason: format!("CSV parse error: {}", e),
        })?;
        transactions.push(parse_record(&record, &columns, line)?);
    }

    Ok(transactions)
}

fn parse_record(
    record: &StringRecord,
    columns: &ColumnMap,
    line: usize,
) -> Result<Transaction, AppError> {
    let field = |index: usize| record.get(index).unwrap_or("");
    let invalid = |reason: String| AppError::InvalidRow { line, reason };

    let date = EntryDate::parse(field(columns.date)).map_err(|e| invalid(e.to_string()))?;

    let type_str = field(columns.kind);
    let kind = TransactionType::from_str(type_str)
        .ok_or_else(|| invalid(format!("unknown type '{}'", type_str)))?;

    let amount_cents = parse_cents(field(columns.amount))
        .map_err(|e| invalid(format!("{} '{}'", e, field(columns.amount))))?;

    let category = match field(columns.category) {
        "" => UNCATEGORIZED,
        category => category,
    };

    let transaction = Transaction::new(kind, amount_cents, date)
        .map_err(|e| invalid(e.to_string()))?
        .with_category(category)
        .with_note(field(columns.note));

    Ok(transaction)
}

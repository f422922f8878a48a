use anyhow::Result;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Ledger, format_cents};

/// Columns of the transactions CSV, in order.
pub const CSV_COLUMNS: [&str; 5] = ["Date", "Type", "Amount", "Category", "Note"];

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export transactions to CSV, oldest first
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.list_transactions();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(CSV_COLUMNS)?;

        for transaction in &transactions {
            csv_writer.write_record([
                transaction.date.to_string(),
                transaction.kind.as_str().to_string(),
                format_cents(transaction.amount_cents),
                transaction.category.clone(),
                transaction.note.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export the full ledger in the data file format
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<&'a Ledger> {
        let ledger = self.service.ledger();
        serde_json::to_writer_pretty(&mut writer, ledger)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(ledger)
    }
}

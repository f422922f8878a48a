// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use pocket_money::application::LedgerService;
use pocket_money::domain::EntryDate;
use tempfile::TempDir;

/// Helper to create a test service over a data file in a temporary directory
pub fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::open(data_file(&temp_dir));
    Ok((service, temp_dir))
}

pub fn data_file(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("pocket_data.json")
}

/// Helper to parse a date string into an EntryDate
pub fn parse_date(date_str: &str) -> EntryDate {
    EntryDate::parse(date_str).unwrap()
}

/// Test fixture: the ledger used throughout the docs
pub struct SampleLedger;

impl SampleLedger {
    /// Starting balance 100; +50 gift, -20 snacks in January, +10 gift in February
    pub fn create(service: &mut LedgerService) -> Result<()> {
        service.set_starting_balance(10000)?;
        service.add_income(5000, parse_date("2024-01-05"), Some("gift".into()), None)?;
        service.add_expense(2000, parse_date("2024-01-10"), Some("snacks".into()), None)?;
        service.add_income(1000, parse_date("2024-02-01"), Some("gift".into()), None)?;
        Ok(())
    }
}

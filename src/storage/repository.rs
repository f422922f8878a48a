use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::domain::Ledger;

/// Default data file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "pocket_data.json";

/// Repository persisting the whole ledger as a single JSON document.
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a corrupted data file is copied before it gets replaced.
    pub fn backup_path(&self) -> PathBuf {
        sibling_path(&self.path, ".corrupt")
    }

    fn temp_path(&self) -> PathBuf {
        sibling_path(&self.path, ".tmp")
    }

    /// Read the ledger, returning `None` if the file doesn't exist and an
    /// error if it can't be read or parsed.
    pub fn read(&self) -> Result<Option<Ledger>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let ledger: Ledger = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        debug!(
            path = %self.path.display(),
            transactions = ledger.transactions.len(),
            "Loaded ledger"
        );
        Ok(Some(ledger))
    }

    /// Read the ledger, falling back to an empty one when the file is
    /// missing or corrupted. A corrupted file is copied to `backup_path`
    /// first so its contents survive the next save.
    pub fn load(&self) -> Ledger {
        match self.read() {
            Ok(Some(ledger)) => ledger,
            Ok(None) => {
                debug!(path = %self.path.display(), "No data file, starting empty");
                Ledger::default()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{:#}", e),
                    "Data file is corrupted or unreadable, starting fresh"
                );
                match self.backup_corrupt_file() {
                    Ok(backup) => warn!(backup = %backup.display(), "Kept a copy of the corrupted file"),
                    Err(e) => warn!(error = %format!("{:#}", e), "Could not back up corrupted file"),
                }
                Ledger::default()
            }
        }
    }

    /// Write the full ledger, replacing the previous contents.
    ///
    /// The document is written to a temporary sibling and renamed over the
    /// data file, so a crash mid-write leaves the old file intact.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let temp_path = self.temp_path();
        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, ledger).context("Failed to serialize ledger")?;
        writer.flush().context("Failed to flush ledger")?;
        writer
            .get_ref()
            .sync_all()
            .context("Failed to sync ledger to disk")?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to replace {}", self.path.display()));
        }

        debug!(
            path = %self.path.display(),
            transactions = ledger.transactions.len(),
            "Saved ledger"
        );
        Ok(())
    }

    fn backup_corrupt_file(&self) -> Result<PathBuf> {
        let backup = self.backup_path();
        fs::copy(&self.path, &backup)
            .with_context(|| format!("Failed to copy to {}", backup.display()))?;
        Ok(backup)
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from(DEFAULT_DATA_FILE));
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryDate, Transaction, TransactionType};
    use tempfile::TempDir;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new(10000);
        ledger.transactions.push(
            Transaction::new(
                TransactionType::In,
                5000,
                EntryDate::parse("2024-01-05").unwrap(),
            )
            .unwrap()
            .with_category("gift"),
        );
        ledger.transactions.push(
            Transaction::new(
                TransactionType::Out,
                1999,
                EntryDate::parse("2024-01-10 16:45").unwrap(),
            )
            .unwrap()
            .with_note("chips"),
        );
        ledger
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::new(temp_dir.path().join("missing.json"));

        assert!(repo.read().unwrap().is_none());
        assert_eq!(repo.load(), Ledger::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::new(temp_dir.path().join("pocket.json"));
        let ledger = sample_ledger();

        repo.save(&ledger).unwrap();
        assert_eq!(repo.load(), ledger);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::new(temp_dir.path().join("pocket.json"));

        repo.save(&sample_ledger()).unwrap();

        assert!(repo.path().exists());
        assert!(!temp_dir.path().join("pocket.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::new(temp_dir.path().join("nested").join("dir").join("pocket.json"));

        repo.save(&Ledger::default()).unwrap();
        assert!(repo.path().exists());
    }

    #[test]
    fn test_corrupted_file_falls_back_and_is_backed_up() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pocket.json");
        fs::write(&path, "{ not json").unwrap();
        let repo = Repository::new(&path);

        assert!(repo.read().is_err());
        assert_eq!(repo.load(), Ledger::default());

        let backup = fs::read_to_string(repo.backup_path()).unwrap();
        assert_eq!(backup, "{ not json");
    }

    #[test]
    fn test_wrong_shape_is_treated_as_corrupted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pocket.json");
        fs::write(
            &path,
            r#"{"starting_balance": 0, "transactions": [{"date": "soon", "type": "IN", "amount": 1}]}"#,
        )
        .unwrap();
        let repo = Repository::new(&path);

        assert!(repo.read().is_err());
        assert_eq!(repo.load(), Ledger::default());
    }

    #[test]
    fn test_amount_beyond_limit_is_treated_as_corrupted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pocket.json");
        fs::write(
            &path,
            r#"{"starting_balance": 0, "transactions": [{"date": "2024-01-05", "type": "IN", "amount": 90071992547409.93}]}"#,
        )
        .unwrap();
        let repo = Repository::new(&path);

        assert!(repo.read().is_err());
        assert_eq!(repo.load(), Ledger::default());
    }

    #[test]
    fn test_reads_files_written_by_earlier_versions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pocket_money_data.json");
        fs::write(
            &path,
            r#"{
    "transactions": [
        {"date": "2024-01-05 18:30", "type": "IN", "amount": 50.0, "note": "from dad"},
        {"date": "2024-01-06 09:15", "type": "OUT", "amount": 12.5, "note": "Expense"}
    ]
}"#,
        )
        .unwrap();

        let ledger = Repository::new(&path).load();
        assert_eq!(ledger.starting_balance, 0);
        assert_eq!(ledger.transactions.len(), 2);
        assert_eq!(ledger.balance(), 3750);
        assert_eq!(ledger.transactions[0].note, "from dad");
    }

    #[test]
    fn test_sibling_path() {
        assert_eq!(
            sibling_path(Path::new("/data/pocket.json"), ".tmp"),
            PathBuf::from("/data/pocket.json.tmp")
        );
        assert_eq!(
            sibling_path(Path::new("ledger"), ".corrupt"),
            PathBuf::from("ledger.corrupt")
        );
    }
}

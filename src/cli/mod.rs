use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{LedgerService, MonthlySummary};
use crate::domain::{
    Cents, EntryDate, Transaction, TransactionType, YearMonth, format_cents, parse_cents,
};
use crate::storage::DEFAULT_DATA_FILE;

/// Pocket Money - track pocket money received and spent
#[derive(Parser)]
#[command(name = "pocket")]
#[command(about = "A local-first pocket money ledger")]
#[command(version)]
pub struct Cli {
    /// Ledger data file path
    #[arg(
        short,
        long,
        global = true,
        env = "POCKET_DATA_FILE",
        default_value = DEFAULT_DATA_FILE
    )]
    pub data_file: PathBuf,

    /// Currency symbol shown before amounts
    #[arg(long, global = true, env = "POCKET_CURRENCY", default_value = "₹")]
    pub currency: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set or update the starting balance
    SetBalance {
        /// New starting balance (e.g., "100" or "100.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Add income (money received)
    Income {
        /// Amount received
        amount: String,

        /// Source, e.g. "From Dad", "Gift" (default: Pocket Money)
        #[arg(short, long)]
        category: Option<String>,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,

        /// Date (YYYY-MM-DD or "YYYY-MM-DD HH:MM", defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Add an expense (money spent)
    Expense {
        /// Amount spent
        amount: String,

        /// Category, e.g. "Snacks", "Movies" (default: Other)
        #[arg(short, long)]
        category: Option<String>,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,

        /// Date (YYYY-MM-DD or "YYYY-MM-DD HH:MM", defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the current balance
    Balance {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show all transactions
    History {
        /// List the most recent transactions first
        #[arg(long)]
        newest_first: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show income, expense and net change for a month
    Summary {
        /// Year (YYYY, defaults to the current year)
        #[arg(long)]
        year: Option<String>,

        /// Month (MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show totals per category
    Categories {
        /// Transaction type to break down
        #[arg(short = 't', long = "type", value_enum, default_value_t = KindArg::Out)]
        kind: KindArg,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show the balance after each transaction
    Timeline {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Export transactions to CSV or the full ledger to JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },

    /// Replace all transactions with the rows of a CSV file
    Import {
        /// CSV file with Date, Type, Amount, Category and Note columns
        input: PathBuf,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete all transactions (the starting balance is kept)
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    In,
    Out,
}

impl From<KindArg> for TransactionType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::In => TransactionType::In,
            KindArg::Out => TransactionType::Out,
        }
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let mut service = LedgerService::open(&self.data_file);
        let money = Money::new(&self.currency);

        match self.command {
            Commands::SetBalance { amount } => {
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                service.set_starting_balance(amount_cents)?;
                println!("Starting balance updated to {}", money.format(amount_cents));
            }

            Commands::Income {
                amount,
                category,
                note,
                date,
            } => {
                let transaction = record(
                    &mut service,
                    TransactionType::In,
                    &amount,
                    category,
                    note,
                    date,
                )?;
                println!(
                    "Income of {} added ({})",
                    money.format(transaction.amount_cents),
                    transaction.category
                );
            }

            Commands::Expense {
                amount,
                category,
                note,
                date,
            } => {
                let transaction = record(
                    &mut service,
                    TransactionType::Out,
                    &amount,
                    category,
                    note,
                    date,
                )?;
                println!(
                    "Expense of {} added ({})",
                    money.format(transaction.amount_cents),
                    transaction.category
                );
            }

            Commands::Balance { format } => run_balance_command(&service, &money, format)?,

            Commands::History {
                newest_first,
                format,
            } => {
                let mut transactions = service.list_transactions();
                if newest_first {
                    transactions.reverse();
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&transactions)?)
                    }
                    OutputFormat::Table if transactions.is_empty() => {
                        println!("No transactions yet.")
                    }
                    OutputFormat::Table => print_transactions(&transactions, &money),
                }
            }

            Commands::Summary {
                year,
                month,
                format,
            } => {
                let month = YearMonth::parse(
                    year.as_deref().unwrap_or(""),
                    month.as_deref().unwrap_or(""),
                    today(),
                )?;
                let summary = service.monthly_summary(month.year(), month.month())?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                    OutputFormat::Table => print_monthly_summary(&summary, &money),
                }
            }

            Commands::Categories { kind, format } => {
                run_categories_command(&service, &money, kind.into(), format)?
            }

            Commands::Timeline { format } => run_timeline_command(&service, &money, format)?,

            Commands::Export { output, format } => run_export_command(&service, output, format)?,

            Commands::Import { input, dry_run } => {
                run_import_command(&mut service, &input, dry_run)?
            }

            Commands::Reset { yes } => {
                if !yes {
                    anyhow::bail!("Refusing to delete all transactions without --yes");
                }
                let removed = service.reset()?;
                println!("Deleted {} transaction(s)", removed);
            }
        }

        Ok(())
    }
}

/// Formats amounts with the configured currency symbol.
struct Money<'a> {
    symbol: &'a str,
}

impl<'a> Money<'a> {
    fn new(symbol: &'a str) -> Self {
        Self { symbol }
    }

    fn format(&self, cents: Cents) -> String {
        if cents < 0 {
            format!("-{}{}", self.symbol, format_cents(-cents))
        } else {
            format!("{}{}", self.symbol, format_cents(cents))
        }
    }

    fn signed(&self, transaction: &Transaction) -> String {
        format!(
            "{}{}{}",
            transaction.kind.sign_symbol(),
            self.symbol,
            format_cents(transaction.amount_cents)
        )
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn record(
    service: &mut LedgerService,
    kind: TransactionType,
    amount: &str,
    category: Option<String>,
    note: Option<String>,
    date: Option<String>,
) -> Result<Transaction> {
    let amount_cents =
        parse_cents(amount).context("Invalid amount format. Use '50.00' or '50'")?;

    let date = match date.as_deref().map(str::trim) {
        Some(date_str) if !date_str.is_empty() => EntryDate::parse(date_str)?,
        _ => EntryDate::from_date(today()),
    };

    let transaction = match kind {
        TransactionType::In => service.add_income(amount_cents, date, category, note)?,
        TransactionType::Out => service.add_expense(amount_cents, date, category, note)?,
    };
    Ok(transaction)
}

fn run_balance_command(service: &LedgerService, money: &Money, format: OutputFormat) -> Result<()> {
    let summary = service.balance_summary();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Table => {
            println!("{:<22} {:>12}", "Current balance", money.format(summary.balance));
            println!(
                "{:<22} {:>12}",
                "Starting balance",
                money.format(summary.starting_balance)
            );
            println!(
                "{:<22} {:>12}",
                "Total income",
                money.format(summary.total_income)
            );
            println!(
                "{:<22} {:>12}",
                "Total expense",
                money.format(summary.total_expense)
            );
            println!("{:<22} {:>12}", "Total transactions", summary.transaction_count);
        }
    }
    Ok(())
}

fn print_transactions(transactions: &[Transaction], money: &Money) {
    println!(
        "{:<17} {:<4} {:>12}  {:<15} NOTE",
        "DATE", "TYPE", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(72));

    for transaction in transactions {
        println!(
            "{:<17} {:<4} {:>12}  {:<15} {}",
            transaction.date.to_string(),
            transaction.kind.as_str(),
            money.signed(transaction),
            truncate(&transaction.category, 15),
            truncate(&transaction.note, 30)
        );
    }
}

fn print_monthly_summary(summary: &MonthlySummary, money: &Money) {
    println!("Summary for {}:", summary.month);
    println!(" - Total Income : {}", money.format(summary.total_income));
    println!(" - Total Expense: {}", money.format(summary.total_expense));
    println!(" - Net Change   : {}", money.format(summary.net));
    println!(" - Transactions : {}", summary.count);

    if !summary.transactions.is_empty() {
        println!("\nDetails:");
        print_transactions(&summary.transactions, money);
    }
}

fn run_categories_command(
    service: &LedgerService,
    money: &Money,
    kind: TransactionType,
    format: OutputFormat,
) -> Result<()> {
    let report = service.category_report(kind);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            if report.categories.is_empty() {
                println!("No {} transactions found.", kind);
                return Ok(());
            }

            println!(
                "{:<20} {:>12} {:>6} {:>7}",
                "CATEGORY", "TOTAL", "COUNT", "SHARE"
            );
            println!("{}", "-".repeat(48));
            for category in &report.categories {
                println!(
                    "{:<20} {:>12} {:>6} {:>6.1}%",
                    truncate(&category.category, 20),
                    money.format(category.total),
                    category.count,
                    category.percentage
                );
            }
            println!("{}", "-".repeat(48));
            println!("{:<20} {:>12}", "TOTAL", money.format(report.total));
        }
    }
    Ok(())
}

fn run_timeline_command(service: &LedgerService, money: &Money, format: OutputFormat) -> Result<()> {
    let points = service.balance_timeline();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&points)?),
        OutputFormat::Table => {
            println!(
                "{:<17} {:>12}",
                "START",
                money.format(service.ledger().starting_balance)
            );
            for point in &points {
                println!(
                    "{:<17} {:>12}",
                    point.date.to_string(),
                    money.format(point.balance)
                );
            }
        }
    }
    Ok(())
}

fn run_export_command(
    service: &LedgerService,
    output: Option<PathBuf>,
    format: ExportFormat,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        ExportFormat::Csv => {
            let count = exporter.export_transactions_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        ExportFormat::Json => {
            let ledger = exporter.export_json(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported ledger with {} transactions",
                    ledger.transactions.len()
                );
            }
        }
    }

    Ok(())
}

fn run_import_command(service: &mut LedgerService, input: &Path, dry_run: bool) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;

    let file = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;

    let result =
        Importer::new(service).import_transactions_csv(file, ImportOptions { dry_run })?;

    if dry_run {
        println!("Validation successful");
        println!("  Would import: {}", result.imported);
        println!("  Would replace: {}", result.replaced);
    } else {
        println!("Import complete");
        println!("  Imported: {}", result.imported);
        println!("  Replaced: {}", result.replaced);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("snacks", 15), "snacks");
        assert_eq!(truncate("a very long category name", 10), "a very ...");
        assert_eq!(truncate("crème brûlée", 8), "crème...");
    }

    #[test]
    fn test_money_format() {
        let money = Money::new("₹");
        assert_eq!(money.format(5000), "₹50.00");
        assert_eq!(money.format(-150), "-₹1.50");
    }

    #[test]
    fn test_money_signed_includes_symbol() {
        let money = Money::new("$");
        let date = EntryDate::parse("2024-01-05").unwrap();
        let income = Transaction::new(TransactionType::In, 5000, date).unwrap();
        let expense = Transaction::new(TransactionType::Out, 1250, date).unwrap();

        assert_eq!(money.signed(&income), "+$50.00");
        assert_eq!(money.signed(&expense), "-$12.50");
    }

    #[test]
    fn test_cli_data_file_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pocket",
            "history",
            "--data-file",
            "x.json",
            "--currency",
            "$",
        ])
        .unwrap();

        assert_eq!(cli.data_file, PathBuf::from("x.json"));
        assert_eq!(cli.currency, "$");
        assert!(matches!(cli.command, Commands::History { .. }));
    }

    #[test]
    fn test_cli_parses_expense() {
        let cli = Cli::try_parse_from([
            "pocket",
            "--data-file",
            "/tmp/ledger.json",
            "expense",
            "20",
            "--category",
            "snacks",
            "--date",
            "2024-01-10",
        ])
        .unwrap();

        assert_eq!(cli.data_file, PathBuf::from("/tmp/ledger.json"));
        assert!(matches!(
            cli.command,
            Commands::Expense { ref amount, ref category, .. }
                if amount == "20" && category.as_deref() == Some("snacks")
        ));
    }

    #[test]
    fn test_cli_negative_starting_balance() {
        let cli = Cli::try_parse_from(["pocket", "set-balance", "-25"]).unwrap();
        assert!(matches!(cli.command, Commands::SetBalance { ref amount } if amount == "-25"));
    }
}

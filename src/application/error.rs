use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{ParseCentsError, ParseDateError, TransactionError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Data file {} is corrupted or unreadable: {reason}", .path.display())]
    CorruptStorage { path: PathBuf, reason: String },

    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<ParseCentsError> for AppError {
    fn from(err: ParseCentsError) -> Self {
        AppError::InvalidAmount(err.to_string())
    }
}

impl From<ParseDateError> for AppError {
    fn from(err: ParseDateError) -> Self {
        AppError::InvalidDate(err.to_string())
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NonPositiveAmount(_) | TransactionError::AmountTooLarge(_) => {
                AppError::InvalidAmount(err.to_string())
            }
        }
    }
}

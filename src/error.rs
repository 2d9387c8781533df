use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Data file {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{column}' in {}", path.display())]
    Schema { path: PathBuf, column: &'static str },

    #[error("Line {line}: invalid {field} value '{value}'")]
    Parse {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("Date {date} appears more than once")]
    DuplicateDate { date: chrono::NaiveDate },

    #[error("Unknown weather code {code} on {date}")]
    Label { code: i64, date: chrono::NaiveDate },

    #[error("Configuration error: {0}")]
    Config(String),
}

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

/// Failures that abort a whole run
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input table not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Latent directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Input table has no '{0}' column")]
    MissingColumn(String),

    #[error("Reference set unavailable: {0}")]
    Reference(#[from] latentdist_core::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook has no worksheet: {}", .0.display())]
    MissingSheet(PathBuf),

    #[error("Workbook read error: {0}")]
    WorkbookRead(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

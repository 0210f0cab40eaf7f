//! Record traits and writer error types
//!
//! Every tabular record type implements [`FlatRecord`]; anything that can be
//! deduplicated implements [`Keyed`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting results
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("'{}' is locked or not writable; close it in other programs and run again", path.display())]
    DestinationLocked { path: PathBuf },

    #[error("Duplicate natural key: '{0}'")]
    DuplicateKey(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type WriteResult<T> = Result<T, WriteError>;

/// A value carrying a natural key used for deduplication
pub trait Keyed {
    /// The natural key. An empty key never collides with anything.
    fn natural_key(&self) -> String;
}

/// A fixed-schema record ready for tabular output
///
/// `columns()` and `values()` must have the same length and order; the
/// schema never depends on which source fields were populated.
pub trait FlatRecord: Keyed {
    /// Column headers in output order
    fn columns() -> Vec<String>;

    /// Cell values in column order
    fn values(&self) -> Vec<String>;

    /// Columns whose values are coerced to `YYYY-MM-DD` on write
    fn date_columns() -> &'static [&'static str] {
        &[]
    }

    /// Excel column widths, by column index. Columns past the end use the
    /// writer's default width.
    fn column_widths() -> &'static [f64] {
        &[]
    }
}

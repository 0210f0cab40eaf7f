//! CSV output
//!
//! Comma-delimited, UTF-8, one header row matching the record schema.

use crate::output::dates::canonical_date;
use crate::output::result_set::ResultSet;
use crate::output::traits::{FlatRecord, WriteError, WriteResult};
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::Path;

/// Writes a result set to `path`, replacing any existing file
///
/// Returns the number of data rows written.
pub fn write_csv<R: FlatRecord>(records: &ResultSet<R>, path: &Path) -> WriteResult<usize> {
    if records.is_empty() {
        tracing::warn!(
            path = %path.display(),
            "No records collected; writing a header-only file"
        );
    }

    let file = open_destination(path)?;
    let rows = write_csv_to(records, file)?;

    tracing::info!(path = %path.display(), rows, "CSV written");
    Ok(rows)
}

/// Writes a result set as CSV into any writer
pub fn write_csv_to<R, W>(records: &ResultSet<R>, writer: W) -> WriteResult<usize>
where
    R: FlatRecord,
    W: io::Write,
{
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);

    csv_writer.write_record(R::columns())?;
    for record in records {
        csv_writer.write_record(coerced_values(record))?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;

    Ok(records.len())
}

/// Values of a record with its date columns canonicalized
pub(crate) fn coerced_values<R: FlatRecord>(record: &R) -> Vec<String> {
    let columns = R::columns();
    let date_columns = R::date_columns();

    record
        .values()
        .into_iter()
        .zip(columns.iter())
        .map(|(value, column)| {
            if date_columns.contains(&column.as_str()) {
                canonical_date(&value)
            } else {
                value
            }
        })
        .collect()
}

/// Clears the destination and opens it for writing
///
/// An existing file is removed first so that a file held open by another
/// program is reported before any work is lost.
pub(crate) fn open_destination(path: &Path) -> WriteResult<File> {
    clear_destination(path)?;
    File::create(path).map_err(|e| destination_error(path, e))
}

/// Removes an existing file at `path`, if any
pub(crate) fn clear_destination(path: &Path) -> WriteResult<()> {
    if path.is_dir() {
        return Err(WriteError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(ErrorKind::Other, "destination is a directory"),
        });
    }

    if path.exists() {
        std::fs::remove_file(path).map_err(|e| destination_error(path, e))?;
    }

    Ok(())
}

pub(crate) fn destination_error(path: &Path, error: io::Error) -> WriteError {
    if error.kind() == ErrorKind::PermissionDenied {
        WriteError::DestinationLocked {
            path: path.to_path_buf(),
        }
    } else {
        WriteError::Io {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

//! Excel workbook output
//!
//! Single worksheet with a bold header row and fixed column widths.

use crate::output::csv_writer::{clear_destination, coerced_values, destination_error};
use crate::output::result_set::ResultSet;
use crate::output::traits::{FlatRecord, WriteError, WriteResult};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

/// Width used for columns the record type does not size explicitly
const DEFAULT_COLUMN_WIDTH: f64 = 20.0;

/// Writes a result set to an `.xlsx` workbook at `path`
///
/// Returns the number of data rows written.
pub fn write_excel<R: FlatRecord>(records: &ResultSet<R>, path: &Path) -> WriteResult<usize> {
    if records.is_empty() {
        tracing::warn!(
            path = %path.display(),
            "No records collected; writing a header-only workbook"
        );
    }

    clear_destination(path)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    let columns = R::columns();
    let widths = R::column_widths();

    for (col, name) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, name, &header_format)?;
        let width = widths
            .get(col as usize)
            .copied()
            .unwrap_or(DEFAULT_COLUMN_WIDTH);
        worksheet.set_column_width(col, width)?;
    }

    for (row, record) in records.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, value) in coerced_values(record).iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row, col as u16, value)?;
            }
        }
    }

    workbook.save(path).map_err(|e| match e {
        XlsxError::IoError(io) => destination_error(path, io),
        other => WriteError::Excel(other),
    })?;

    tracing::info!(path = %path.display(), rows = records.len(), "Workbook written");
    Ok(records.len())
}

use crate::error::Result;
use crate::table::Table;
use csv::{Terminator, WriterBuilder};

/// Convert a table to CSV bytes
///
/// This function exports a table to CSV (Comma-Separated Values) format.
/// - The header row comes first, in the original column order
/// - Fields are only quoted when they contain a delimiter, quote or newline
/// - Lines end with `\n` and the output is UTF-8
///
/// # Arguments
/// * `table` - Reference to the table to convert
///
/// # Returns
/// * `Result<Vec<u8>>` - CSV content or an error
///
/// # Examples
/// ```
/// use csv_desk::downloader::to_csv;
/// use csv_desk::table::Table;
///
/// let table = Table::new(vec!["a".into()], vec![vec!["1".into()]]);
/// assert_eq!(to_csv(&table).unwrap(), b"a\n1\n");
/// ```
pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// Name offered to the browser for a filtered download
pub fn download_filename(filename: &str) -> String {
    format!("filtered_{}", filename)
}

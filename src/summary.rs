use crate::dates::parse_date;
use crate::table::{ORDER_DATE_COLUMN, Table};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Text of a datewise summary email, plus a warning for the page if any
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub text: String,
    pub warning: Option<String>,
}

pub fn summary_subject(filename: &str) -> String {
    format!("Datewise Summary: {}", filename)
}

/// Count rows per calendar day of the order date column
///
/// Cells that cannot be read as a date are dropped before grouping. Days
/// come out in ascending order.
pub fn count_by_date(table: &Table, column: usize) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for day in table.column(column).filter_map(parse_date) {
        *counts.entry(day).or_insert(0) += 1;
    }
    counts
}

/// Build the datewise summary for an uploaded file
///
/// # Arguments
/// * `table` - The uploaded table
/// * `filename` - Name shown in the summary heading
///
/// # Returns
/// * `Summary` - Email body, and a warning when the date column is missing
pub fn datewise_summary(table: &Table, filename: &str) -> Summary {
    let mut text = format!("Datewise Summary for {}:\n\n", filename);

    let Some(col) = table.column_index(ORDER_DATE_COLUMN) else {
        tracing::warn!(file = filename, column = ORDER_DATE_COLUMN, "column not found for summary");
        text.push_str(&format!("Column '{}' not found in the file.", ORDER_DATE_COLUMN));
        return Summary {
            text,
            warning: Some(format!("Column '{}' not found for summary.", ORDER_DATE_COLUMN)),
        };
    };

    let counts = count_by_date(table, col);
    if counts.is_empty() {
        tracing::warn!(file = filename, "no valid dates found");
        text.push_str(&format!(
            "No valid dates found in column '{}' or column is empty after conversion.",
            ORDER_DATE_COLUMN
        ));
    } else {
        tracing::info!(file = filename, days = counts.len(), "generated datewise summary");
        text.push_str(&format_counts(&counts));
    }

    Summary {
        text,
        warning: None,
    }
}

// Right-aligned two column text table
fn format_counts(counts: &BTreeMap<NaiveDate, usize>) -> String {
    let headers = ["Date", "Record Count"];
    let cells: Vec<[String; 2]> = counts
        .iter()
        .map(|(day, n)| [day.format("%Y-%m-%d").to_string(), n.to_string()])
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(format!(
        "{:>w0$}  {:>w1$}",
        headers[0],
        headers[1],
        w0 = widths[0],
        w1 = widths[1]
    ));
    for [day, n] in &cells {
        lines.push(format!("{:>w0$}  {:>w1$}", day, n, w0 = widths[0], w1 = widths[1]));
    }

    lines.join("\n")
}

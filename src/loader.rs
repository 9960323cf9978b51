use crate::error::{AppError, Result};
use crate::table::Table;
use csv::ReaderBuilder;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Extensions accepted by the upload form
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv"];

/// Text encoding that successfully decoded an uploaded file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEncoding::Utf8 => write!(f, "utf-8"),
            SourceEncoding::Latin1 => write!(f, "latin1"),
        }
    }
}

/// Load a table from a CSV file on disk
///
/// Reads the whole file and hands the bytes to [`parse_bytes`]. The file is
/// never modified.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<Table>` - The parsed table or the reason it could not be read
///
/// # Examples
/// ```no_run
/// use csv_desk::loader::load_table;
///
/// match load_table("uploads/orders.csv") {
///     Ok(table) => println!("Loaded {} rows", table.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn load_table(filepath: impl AsRef<Path>) -> Result<Table> {
    let path = filepath.as_ref();
    let bytes = std::fs::read(path)?;
    let (table, encoding) = parse_bytes(&bytes)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::info!(file = %name, %encoding, rows = table.len(), "read CSV");

    Ok(table)
}

/// Parse raw CSV bytes into a table
///
/// UTF-8 is tried first (a leading byte-order mark is ignored); bytes that
/// are not valid UTF-8 are decoded as Latin-1 instead. The first non-blank
/// record is the header row.
///
/// # Errors
/// * `AppError::EmptyData` if there is no header row
/// * `AppError::RaggedRow` if a record has more fields than the header
/// * `AppError::Csv` for malformed CSV
pub fn parse_bytes(bytes: &[u8]) -> Result<(Table, SourceEncoding)> {
    let (text, encoding) = decode(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let raw_headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if raw_headers.is_empty() {
        return Err(AppError::EmptyData);
    }
    let headers = dedupe_headers(raw_headers);
    let width = headers.len();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            return Err(AppError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: width,
                found: record.len(),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok((Table::new(headers, rows), encoding))
}

fn decode(bytes: &[u8]) -> (Cow<'_, str>, SourceEncoding) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(body) {
        Ok(text) => (Cow::Borrowed(text), SourceEncoding::Utf8),
        Err(_) => {
            tracing::debug!("input is not valid utf-8, falling back to latin1");
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(body);
            (text, SourceEncoding::Latin1)
        }
    }
}

// Blank headers become "Unnamed: N"; repeats get ".1", ".2" suffixes
fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (i, header) in raw.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header
        };

        let mut name = base.clone();
        while used.contains(&name) {
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }

        used.insert(name.clone());
        headers.push(name);
    }

    headers
}

/// Check whether an uploaded file name has an accepted extension
///
/// # Examples
/// ```
/// use csv_desk::loader::allowed_file;
///
/// assert!(allowed_file("orders.CSV"));
/// assert!(!allowed_file("orders.xlsx"));
/// assert!(!allowed_file("csv"));
/// ```
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Reduce an uploaded file name to something safe to join onto a directory
///
/// Accented letters lose their accents (NFKD), other non-ASCII characters
/// are dropped, path separators and whitespace runs
/// collapse to a single underscore, and anything outside `[A-Za-z0-9_.-]`
/// is removed. Leading and trailing dots and underscores are stripped, so
/// the result may be empty.
///
/// # Examples
/// ```
/// use csv_desk::loader::secure_filename;
///
/// assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
/// assert_eq!(secure_filename("my orders (1).csv"), "my_orders_1.csv");
/// ```
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

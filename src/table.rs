use serde::Serialize;

/// Column holding the order timestamp used by the summary and the date filter
pub const ORDER_DATE_COLUMN: &str = "Order Date";

/// Column holding the restaurant name used by the equality filter
pub const RESTAURANT_COLUMN: &str = "Restaurant Name";

/// In-memory table read from an uploaded CSV file
///
/// Values are kept as the raw text found in the file. Every row holds
/// exactly `headers.len()` cells; short records are padded with empty
/// strings when the table is built.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding or truncating every row to the header width
    ///
    /// # Arguments
    /// * `headers` - Column names, in file order
    /// * `rows` - Data rows
    ///
    /// # Returns
    /// * `Table` - A rectangular table
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Table { headers, rows }
    }

    /// Number of data rows (the header is not counted)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows, even if it has columns
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over the values of one column, in row order
    pub fn column<'a>(&'a self, index: usize) -> impl Iterator<Item = &'a str> + 'a {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    /// First `n` rows as a new table
    pub fn head(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Keep only the rows at `indices`, in the order given
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Drop the rows at `indices`, keeping the rest in file order
    pub fn without(&self, indices: &[usize]) -> Table {
        let mut dropped = vec![false; self.rows.len()];
        for &i in indices {
            if let Some(flag) = dropped.get_mut(i) {
                *flag = true;
            }
        }

        Table {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .zip(dropped)
                .filter(|(_, gone)| !gone)
                .map(|(row, _)| row.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Order Date".into(), "Restaurant Name".into()],
            vec![
                vec!["2024-01-01".into(), "Alpha".into()],
                vec!["2024-01-02".into()],
                vec!["2024-01-03".into(), "Gamma".into(), "extra".into()],
            ],
        )
    }

    #[test]
    fn rows_are_made_rectangular() {
        let table = sample();
        assert!(table.rows.iter().all(|r| r.len() == 2));
        assert_eq!(table.rows[1][1], "");
        assert_eq!(table.rows[2], vec!["2024-01-03", "Gamma"]);
    }

    #[test]
    fn column_lookup_is_exact() {
        let table = sample();
        assert_eq!(table.column_index(RESTAURANT_COLUMN), Some(1));
        assert!(!table.has_column("restaurant name"));
        let dates: Vec<&str> = table.column(0).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn select_and_without_partition_rows() {
        let table = sample();
        let kept = table.select(&[0, 2]);
        let rest = table.without(&[0, 2]);
        assert_eq!(kept.len(), 2);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest.rows[0][0], "2024-01-02");
        assert_eq!(table.without(&[7]).len(), 3);
    }

    #[test]
    fn head_caps_row_count() {
        let table = sample();
        assert_eq!(table.head(2).len(), 2);
        assert_eq!(table.head(50).len(), 3);
        assert!(Table::new(vec!["a".into()], vec![]).is_empty());
    }
}

use crate::dates::parse_date;
use crate::table::{ORDER_DATE_COLUMN, RESTAURANT_COLUMN, Table};

/// Optional equality predicates submitted with the filter form
///
/// Empty strings are treated the same as a missing value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    pub date: Option<String>,
    pub restaurant: Option<String>,
}

impl FilterCriteria {
    pub fn new(date: Option<String>, restaurant: Option<String>) -> Self {
        FilterCriteria {
            date: date.filter(|d| !d.is_empty()),
            restaurant: restaurant.filter(|r| !r.is_empty()),
        }
    }
}

/// Result of applying [`FilterCriteria`] to a table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOutcome {
    /// Indices of the rows that satisfied every applied filter, in row order
    pub matched: Vec<usize>,

    /// Human readable description of each filter that was applied
    pub active_filters: Vec<String>,

    /// Filters that were requested but skipped, and why
    pub warnings: Vec<String>,
}

impl FilterOutcome {
    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    /// Summary line shown next to filter results
    pub fn describe(&self) -> String {
        if self.active_filters.is_empty() {
            "No filters applied.".to_string()
        } else {
            format!("Filters applied: {}", self.active_filters.join(", "))
        }
    }
}

/// Apply the date and restaurant predicates to a table
///
/// Each predicate is skipped, with a warning, when its column is missing.
/// An unparseable date criterion is also skipped with a warning. Cells whose
/// date cannot be parsed never match a date filter, and empty restaurant
/// cells never match a restaurant filter.
///
/// # Arguments
/// * `table` - The table to filter
/// * `criteria` - The submitted predicates
///
/// # Returns
/// * `FilterOutcome` - Matching row indices plus the applied/skipped filters
pub fn apply_filters(table: &Table, criteria: &FilterCriteria) -> FilterOutcome {
    let mut outcome = FilterOutcome {
        matched: (0..table.len()).collect(),
        ..FilterOutcome::default()
    };

    if let Some(raw_date) = &criteria.date {
        match table.column_index(ORDER_DATE_COLUMN) {
            None => {
                tracing::warn!(column = ORDER_DATE_COLUMN, "column not found for filtering");
                outcome
                    .warnings
                    .push(format!("Column '{}' not found for filtering.", ORDER_DATE_COLUMN));
            }
            Some(col) => match parse_date(raw_date) {
                None => outcome.warnings.push(format!(
                    "Invalid date format entered: '{}'. Please use YYYY-MM-DD.",
                    raw_date
                )),
                Some(wanted) => {
                    outcome
                        .matched
                        .retain(|&i| parse_date(&table.rows[i][col]) == Some(wanted));
                    outcome
                        .active_filters
                        .push(format!("{} = {}", ORDER_DATE_COLUMN, raw_date));
                    tracing::info!(remaining = outcome.matched.len(), "applied date filter");
                }
            },
        }
    }

    if let Some(restaurant) = &criteria.restaurant {
        match table.column_index(RESTAURANT_COLUMN) {
            None => {
                tracing::warn!(column = RESTAURANT_COLUMN, "column not found for filtering");
                outcome
                    .warnings
                    .push(format!("Column '{}' not found for filtering.", RESTAURANT_COLUMN));
            }
            Some(col) => {
                outcome
                    .matched
                    .retain(|&i| table.rows[i][col] == *restaurant);
                outcome
                    .active_filters
                    .push(format!("{} = '{}'", RESTAURANT_COLUMN, restaurant));
                tracing::info!(remaining = outcome.matched.len(), "applied restaurant filter");
            }
        }
    }

    outcome
}

/// Rows that would remain if every matched row were deleted
///
/// Nothing is written back; the caller only displays the result.
pub fn simulate_delete(table: &Table, outcome: &FilterOutcome) -> Table {
    table.without(&outcome.matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Table {
        Table::new(
            vec!["Order Date".into(), "Restaurant Name".into(), "Total".into()],
            vec![
                vec!["2024-01-01 12:00:00".into(), "Alpha".into(), "10".into()],
                vec!["2024-01-01 19:30:00".into(), "Beta".into(), "12".into()],
                vec!["2024-01-02 08:15:00".into(), "Alpha".into(), "7".into()],
                vec!["garbage".into(), "alpha".into(), "3".into()],
                vec!["2024-01-02".into(), "".into(), "1".into()],
            ],
        )
    }

    #[test]
    fn no_criteria_matches_everything() {
        let outcome = apply_filters(&orders(), &FilterCriteria::default());
        assert_eq!(outcome.matched, vec![0, 1, 2, 3, 4]);
        assert_eq!(outcome.describe(), "No filters applied.");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn empty_strings_are_absent() {
        let criteria = FilterCriteria::new(Some(String::new()), Some(String::new()));
        assert_eq!(criteria, FilterCriteria::default());
    }

    #[test]
    fn date_filter_ignores_time_and_bad_cells() {
        let criteria = FilterCriteria::new(Some("2024-01-01".into()), None);
        let outcome = apply_filters(&orders(), &criteria);
        assert_eq!(outcome.matched, vec![0, 1]);
        assert_eq!(outcome.describe(), "Filters applied: Order Date = 2024-01-01");
    }

    #[test]
    fn restaurant_filter_is_case_sensitive() {
        let criteria = FilterCriteria::new(None, Some("Alpha".into()));
        let outcome = apply_filters(&orders(), &criteria);
        assert_eq!(outcome.matched, vec![0, 2]);
    }

    #[test]
    fn both_filters_combine() {
        let criteria = FilterCriteria::new(Some("2024-01-02".into()), Some("Alpha".into()));
        let outcome = apply_filters(&orders(), &criteria);
        assert_eq!(outcome.matched, vec![2]);
        assert_eq!(
            outcome.describe(),
            "Filters applied: Order Date = 2024-01-02, Restaurant Name = 'Alpha'"
        );
    }

    #[test]
    fn invalid_date_is_skipped_with_warning() {
        let criteria = FilterCriteria::new(Some("soon".into()), Some("Beta".into()));
        let outcome = apply_filters(&orders(), &criteria);
        assert_eq!(outcome.matched, vec![1]);
        assert_eq!(
            outcome.warnings,
            vec!["Invalid date format entered: 'soon'. Please use YYYY-MM-DD."]
        );
        assert_eq!(outcome.active_filters.len(), 1);
    }

    #[test]
    fn missing_columns_skip_filters() {
        let table = Table::new(vec!["id".into()], vec![vec!["1".into()], vec!["2".into()]]);
        let criteria = FilterCriteria::new(Some("2024-01-01".into()), Some("Alpha".into()));
        let outcome = apply_filters(&table, &criteria);
        assert_eq!(outcome.matched, vec![0, 1]);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(outcome.warnings[0], "Column 'Order Date' not found for filtering.");
        assert_eq!(outcome.warnings[1], "Column 'Restaurant Name' not found for filtering.");
        assert_eq!(outcome.describe(), "No filters applied.");
    }

    #[test]
    fn delete_keeps_unmatched_rows() {
        let table = orders();
        let criteria = FilterCriteria::new(None, Some("Alpha".into()));
        let outcome = apply_filters(&table, &criteria);
        let remaining = simulate_delete(&table, &outcome);
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining.rows[0][1], "Beta");
        assert_eq!(table.len(), 5);
    }
}

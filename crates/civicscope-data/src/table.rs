//! Raw tabular input
//!
//! A [`RawTable`] is the untyped shape a CSV export arrives in: one header row
//! and any number of string rows. Rows may be shorter than the header; the
//! missing trailing cells read as absent.

/// A header row plus string cells, exactly as read from a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from anything yielding header names and rows of cells.
    ///
    /// # Examples
    ///
    /// ```
    /// use civicscope_data::table::RawTable;
    ///
    /// let table = RawTable::new(["district", "population"], [["Udupi", "1177361"]]);
    /// assert_eq!(table.headers, vec!["district", "population"]);
    /// assert_eq!(table.cell(0, 1), Some("1177361"));
    /// ```
    #[must_use]
    pub fn new<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Number of data rows (the header is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cell at `row`/`column`, or `None` if either is out of range.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_row_reads_missing_cell() {
        let table = RawTable::new(["a", "b", "c"], [vec!["1"], vec!["1", "2", "3"]]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), Some("1"));
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(1, 2), Some("3"));
        assert_eq!(table.cell(2, 0), None);
    }

    #[test]
    fn test_empty_table() {
        let table = RawTable::new(["district"], Vec::<Vec<String>>::new());
        assert!(table.is_empty());
    }
}

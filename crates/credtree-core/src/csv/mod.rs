//! CSV tokenizer for credential exports
//!
//! Produces a header row and one [`RawRow`] per data row, keyed by the header
//! text exactly as it appeared in the file.
//!
//! # Example
//!
//! ```rust
//! use credtree_core::csv;
//!
//! let table = csv::parse("\u{feff}Title,Username\n\"Smith, \"\"Bob\"\"\",bob\n");
//! assert_eq!(table.headers, vec!["Title", "Username"]);
//! assert_eq!(table.rows[0].get("Title"), Some("Smith, \"Bob\""));
//! ```

mod scanner;

use std::collections::HashMap;

pub use scanner::Scanner;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One data row: header name to raw cell text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: HashMap<String, String>,
}

impl RawRow {
    /// Map a record positionally onto the headers.
    ///
    /// Missing trailing cells become empty strings; cells beyond the header
    /// width are ignored. A repeated header keeps its rightmost cell.
    fn from_record(headers: &[String], mut record: Vec<String>) -> Self {
        record.resize(headers.len().max(record.len()), String::new());
        let cells = headers.iter().cloned().zip(record).collect();
        Self { cells }
    }

    /// Raw cell for a header, if the header exists.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Tokenized file contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl CsvTable {
    /// True when no header row was found. Callers treat this as "no data".
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// True when there is nothing to hash: no headers or no data rows.
    pub fn is_empty(&self) -> bool {
        !self.has_headers() || self.rows.is_empty()
    }
}

/// Tokenize CSV text into headers and rows.
///
/// A leading byte-order mark is stripped. Records consisting of a single
/// empty cell (blank lines) are dropped, which also drops an empty first line.
/// The first retained record is the header row.
pub fn parse(input: &str) -> CsvTable {
    let input = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);

    let mut records = Scanner::new(input).filter(|r| !is_blank(r));

    let headers = match records.next() {
        Some(headers) => headers,
        None => return CsvTable::default(),
    };

    let rows = records
        .map(|record| RawRow::from_record(&headers, record))
        .collect();

    CsvTable { headers, rows }
}

fn is_blank(record: &[String]) -> bool {
    matches!(record, [only] if only.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headers_and_rows() {
        let table = parse("title,username\nmail,alice\nbank,bob\n");
        assert_eq!(table.headers, vec!["title", "username"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].get("username"), Some("bob"));
    }

    #[test]
    fn strips_bom() {
        let table = parse("\u{feff}title\nx\n");
        assert_eq!(table.headers, vec!["title"]);
    }

    #[test]
    fn drops_empty_first_line() {
        let table = parse("\n\ntitle,password\nmail,pw\n");
        assert_eq!(table.headers, vec!["title", "password"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn drops_trailing_blank_lines() {
        let table = parse("title\nmail\n\n\r\n");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse("title,username,password\nmail\n");
        let row = &table.rows[0];
        assert_eq!(row.get("title"), Some("mail"));
        assert_eq!(row.get("username"), Some(""));
        assert_eq!(row.get("password"), Some(""));
    }

    #[test]
    fn row_of_empty_cells_is_kept() {
        let table = parse("a,b\n,\n");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("a"), Some(""));
    }

    #[test]
    fn extra_cells_are_ignored() {
        let table = parse("a\n1,2,3\n");
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.rows[0].get("a"), Some("1"));
    }

    #[test]
    fn quoted_field_with_escapes() {
        let table = parse("title\n\"Smith, \"\"Bob\"\"\"\n");
        assert_eq!(table.rows[0].get("title"), Some(r#"Smith, "Bob""#));
    }

    #[test]
    fn no_header_row() {
        assert!(!parse("").has_headers());
        assert!(!parse("\n\n\r\n").has_headers());
        assert!(!parse("\u{feff}").has_headers());
    }

    #[test]
    fn header_only_is_empty() {
        let table = parse("title,password\n");
        assert!(table.has_headers());
        assert!(table.is_empty());
    }
}

//! Character-at-a-time CSV scanner
//!
//! Supports the subset of CSV that password-manager exports actually use:
//! comma delimiters, double-quoted fields, doubled quotes as escapes and
//! LF / CRLF / CR line breaks. Malformed quoting never errors; the scanner
//! always consumes the whole input.

use std::iter::Peekable;
use std::str::Chars;

const QUOTE: char = '"';
const DELIMITER: char = ',';

/// Streaming scanner producing records as vectors of cell strings
pub struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    in_quotes: bool,
    field: String,
    record: Vec<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            in_quotes: false,
            field: String::new(),
            record: Vec::new(),
        }
    }

    fn end_field(&mut self) {
        self.record.push(std::mem::take(&mut self.field));
    }

    fn end_record(&mut self) -> Vec<String> {
        self.end_field();
        std::mem::take(&mut self.record)
    }

    /// Scan the next record, or `None` once the input is exhausted.
    fn next_record(&mut self) -> Option<Vec<String>> {
        while let Some(c) = self.chars.next() {
            if self.in_quotes {
                if c == QUOTE {
                    if self.chars.peek() == Some(&QUOTE) {
                        self.chars.next();
                        self.field.push(QUOTE);
                    } else {
                        self.in_quotes = false;
                    }
                } else {
                    self.field.push(c);
                }
                continue;
            }

            match c {
                QUOTE => self.in_quotes = true,
                DELIMITER => self.end_field(),
                '\r' => {
                    if self.chars.peek() == Some(&'\n') {
                        self.chars.next();
                    }
                    return Some(self.end_record());
                }
                '\n' => return Some(self.end_record()),
                _ => self.field.push(c),
            }
        }

        // Trailing record without a final line break
        if !self.field.is_empty() || !self.record.is_empty() {
            return Some(self.end_record());
        }
        None
    }
}

impl Iterator for Scanner<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(input: &str) -> Vec<Vec<String>> {
        Scanner::new(input).collect()
    }

    #[test]
    fn simple_records() {
        assert_eq!(
            scan("a,b\nc,d\n"),
            vec![vec!["a", "b"], vec!["c", "d"]]
        );
    }

    #[test]
    fn crlf_is_one_break() {
        assert_eq!(scan("a,b\r\nc,d"), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn lone_cr_breaks_record() {
        assert_eq!(scan("a\rb"), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn escaped_quote_and_embedded_comma() {
        assert_eq!(scan(r#""Smith, ""Bob""""#), vec![vec![r#"Smith, "Bob""#]]);
    }

    #[test]
    fn newline_inside_quotes_is_literal() {
        assert_eq!(scan("\"line1\nline2\",x\n"), vec![vec!["line1\nline2", "x"]]);
    }

    #[test]
    fn quote_mid_field_toggles() {
        assert_eq!(scan("ab\"c,d\"e,f\n"), vec![vec!["abc,de", "f"]]);
    }

    #[test]
    fn unterminated_quote_consumes_rest() {
        assert_eq!(scan("a,\"b,c\nd"), vec![vec!["a", "b,c\nd"]]);
    }

    #[test]
    fn blank_line_yields_single_empty_cell() {
        assert_eq!(scan("a\n\nb\n"), vec![vec!["a"], vec![""], vec!["b"]]);
    }

    #[test]
    fn trailing_comma_keeps_empty_cell() {
        assert_eq!(scan("a,\n"), vec![vec!["a", ""]]);
    }

    #[test]
    fn empty_input() {
        assert!(scan("").is_empty());
    }
}

use nom::error::{VerboseError, VerboseErrorKind};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A location in the JSON text where reading failed.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("at {line}:{col} :: {msg}")]
pub struct ParseError {
    /// The line number. One-based, but can be zero if the input was empty.
    pub line: usize,
    /// The column number. One-based, but can be zero if the input was empty.
    pub col: usize,
    /// The line contents.
    pub linestr: String,
    /// The error message.
    pub msg: String,
}

impl ParseError {
    pub(super) fn at(src: &str, offset: usize, msg: String) -> Self {
        let lines = lines_to_map(src);
        match get_line(&lines, offset) {
            Some((line_offset, line, linestr)) => {
                let col = offset.saturating_sub(line_offset).min(linestr.len());
                ParseError {
                    line,
                    col: linestr[..col].chars().count() + 1, // col is one-based
                    linestr: linestr.to_string(),
                    msg,
                }
            }
            None => ParseError {
                line: 0,
                col: 0,
                linestr: String::new(),
                msg: format!("{}, got empty input", msg),
            },
        }
    }

    pub(super) fn from_nom(src: &str, err: VerboseError<&str>) -> Self {
        let (offset, msg) = match err.errors.first() {
            Some((i, kind)) => (offset(src, i), kind_msg(i, kind)),
            None => (src.len(), String::from("unexpected input")),
        };
        ParseError::at(src, offset, msg)
    }

    /// The error message with the offending line and a caret under the column.
    ///
    /// # Example
    /// ```rust
    /// # use jsonmap::*;
    /// let err = Doc::parse("[1,\n 2,\n 3 4]").unwrap_err();
    /// assert_eq!(
    ///     err.trace(),
    ///     "at 3:4 :: expected ',' or ']'\n 3 4]\n   ^"
    /// );
    /// ```
    pub fn trace(&self) -> String {
        Trace(self).to_string()
    }
}

struct Trace<'a>(&'a ParseError);

impl<'a> fmt::Display for Trace<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let e = self.0;
        writeln!(f, "{}", e)?;
        write!(f, "{}", e.linestr)?;
        if e.col > 0 {
            writeln!(f)?;
            for _ in 0..e.col.saturating_sub(1) {
                write!(f, " ")?;
            }
            write!(f, "^")?;
        }

        Ok(())
    }
}

fn kind_msg(i: &str, kind: &VerboseErrorKind) -> String {
    match kind {
        VerboseErrorKind::Char(c) => match i.chars().next() {
            Some(found) => format!("expected '{}', found '{}'", c, found),
            None => format!("expected '{}', got end of input", c),
        },
        VerboseErrorKind::Context(s) => s.to_string(),
        VerboseErrorKind::Nom(e) => format!("in {:?}", e),
    }
}

fn offset(src: &str, sub: &str) -> usize {
    (sub.as_ptr() as usize) - (src.as_ptr() as usize)
}

/// Format `(line_offset, line_idx, line)`.
fn get_line<'a>(
    lines: &BTreeMap<usize, (usize, &'a str)>,
    offset: usize,
) -> Option<(usize, usize, &'a str)> {
    lines
        .range(..=offset)
        .last()
        .map(|x| (*x.0, (x.1).0, (x.1).1))
}

/// Lines indices are one-based.
fn lines_to_map(src: &str) -> BTreeMap<usize, (usize, &str)> {
    src.lines()
        .enumerate()
        .map(|(idx, line)| (offset(src, line), (idx + 1, line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_to_map() {
        let s = "Hello\nA\r\nBrave\r\nWorld";
        let map = lines_to_map(s);
        let mut iter = map.iter();
        assert_eq!(iter.next(), Some((&0, &(1, "Hello"))));
        assert_eq!(iter.next(), Some((&6, &(2, "A"))));
        assert_eq!(iter.next(), Some((&9, &(3, "Brave"))));
        assert_eq!(iter.next(), Some((&16, &(4, "World"))));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_get_line() {
        let map = lines_to_map("");
        assert_eq!(get_line(&map, 0), None);

        let map = lines_to_map("Hello\nA\r\nBrave");
        assert_eq!(get_line(&map, 0), Some((0, 1, "Hello")));
        assert_eq!(get_line(&map, 5), Some((0, 1, "Hello")));
        assert_eq!(get_line(&map, 6), Some((6, 2, "A")));
        assert_eq!(get_line(&map, 8), Some((6, 2, "A")));
        assert_eq!(get_line(&map, 12), Some((9, 3, "Brave")));
    }

    #[test]
    fn error_positions() {
        let e = ParseError::at("[1,\n  x]", 6, "expected a value".into());
        assert_eq!(e.line, 2);
        assert_eq!(e.col, 3);
        assert_eq!(e.to_string(), "at 2:3 :: expected a value");

        let e = ParseError::at("", 0, "expected a value".into());
        assert_eq!(e.line, 0);
        assert_eq!(e.msg, "expected a value, got empty input");
    }
}

// crates/kebab-store-core/src/core/codec.rs
// ============================================================================
// Module: Kebab Store Delimited Codec
// Description: Comma-delimited record encoding with quoted fields.
// Purpose: Map rows to and from the flat-file text format.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Records are comma-delimited. Fields containing a comma, a quote, CR or LF
//! are wrapped in double quotes with embedded quotes doubled, so quoted fields
//! may span lines. A null field is written as nothing; an empty string is
//! written as `""` so both survive a round trip. A blank line is therefore a
//! record with one null field, which keeps single-column tables lossless.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::core::row::Row;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while parsing delimited text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Quoted field never closed.
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote {
        /// Line where the field started.
        line: usize,
    },
    /// Quote character inside an unquoted field.
    #[error("unexpected quote in unquoted field on line {line}")]
    StrayQuote {
        /// Line of the offending quote.
        line: usize,
    },
    /// Text after a closing quote that is not a delimiter.
    #[error("unexpected '{found}' after closing quote on line {line}")]
    TrailingCharacter {
        /// Offending character.
        found: char,
        /// Line of the offending character.
        line: usize,
    },
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes one record without a line terminator.
#[must_use]
pub fn encode_record(row: &Row) -> String {
    row.fields().iter().map(|field| encode_field(field.as_deref())).collect::<Vec<_>>().join(",")
}

/// Encodes records, each terminated by `\n`.
#[must_use]
pub fn encode_records(rows: &[Row]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&encode_record(row));
        out.push('\n');
    }
    out
}

/// Encodes one field, quoting when required.
fn encode_field(field: Option<&str>) -> Cow<'_, str> {
    let Some(text) = field else {
        return Cow::Borrowed("");
    };
    if text.is_empty() || text.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses delimited text into rows. A blank line is one null field.
///
/// # Errors
///
/// Returns [`CodecError`] on unbalanced or misplaced quotes.
pub fn parse_records(input: &str) -> Result<Vec<Row>, CodecError> {
    let mut chars = input.chars().peekable();
    let mut records = Vec::new();
    let mut fields: Vec<Option<String>> = Vec::new();
    let mut line = 1;
    loop {
        if fields.is_empty() && chars.peek().is_none() {
            break;
        }
        let field = if chars.peek() == Some(&'"') {
            chars.next();
            Some(parse_quoted(&mut chars, &mut line)?)
        } else {
            parse_unquoted(&mut chars, line)?
        };
        fields.push(field);
        match chars.next() {
            Some(',') => {}
            Some(end @ ('\n' | '\r')) => {
                if end == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                records.push(Row::new(std::mem::take(&mut fields)));
            }
            None => {
                records.push(Row::new(std::mem::take(&mut fields)));
                break;
            }
            Some(found) => {
                return Err(CodecError::TrailingCharacter {
                    found,
                    line,
                });
            }
        }
    }
    Ok(records)
}

/// Reads a quoted field body; the opening quote is already consumed.
fn parse_quoted(chars: &mut Peekable<Chars<'_>>, line: &mut usize) -> Result<String, CodecError> {
    let start = *line;
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('"') if chars.peek() == Some(&'"') => {
                chars.next();
                text.push('"');
            }
            Some('"') => return Ok(text),
            Some(ch) => {
                if ch == '\n' {
                    *line += 1;
                }
                text.push(ch);
            }
            None => {
                return Err(CodecError::UnterminatedQuote {
                    line: start,
                });
            }
        }
    }
}

/// Reads an unquoted field up to the next delimiter.
fn parse_unquoted(
    chars: &mut Peekable<Chars<'_>>,
    line: usize,
) -> Result<Option<String>, CodecError> {
    let mut text = String::new();
    while let Some(&ch) = chars.peek() {
        match ch {
            ',' | '\n' | '\r' => break,
            '"' => {
                return Err(CodecError::StrayQuote {
                    line,
                });
            }
            _ => {
                text.push(ch);
                chars.next();
            }
        }
    }
    Ok((!text.is_empty()).then_some(text))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::CodecError;
    use super::encode_records;
    use super::parse_records;
    use crate::core::row::Row;

    #[test]
    fn quotes_fields_with_delimiters_and_newlines() {
        let row = Row::new(vec![
            Some("Kebab, large".to_string()),
            Some("say \"hi\"".to_string()),
            Some("two\nlines".to_string()),
            None,
            Some(String::new()),
        ]);
        let text = encode_records(std::slice::from_ref(&row));
        assert_eq!(text, "\"Kebab, large\",\"say \"\"hi\"\"\",\"two\nlines\",,\"\"\n");
        assert_eq!(parse_records(&text).unwrap(), vec![row]);
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let rows = parse_records("id,name\r\n7,Doner\r\n").unwrap();
        assert_eq!(rows, vec![Row::from_texts(["id", "name"]), Row::from_texts(["7", "Doner"])]);
    }

    #[test]
    fn lone_null_field_survives_as_blank_line() {
        let rows = vec![Row::from_texts(["note"]), Row::new(vec![None]), Row::from_texts(["x"])];
        let text = encode_records(&rows);
        assert_eq!(text, "note\n\nx\n");
        assert_eq!(parse_records(&text).unwrap(), rows);
    }

    #[test]
    fn trailing_delimiter_yields_null_field() {
        let rows = parse_records("a,").unwrap();
        assert_eq!(rows, vec![Row::new(vec![Some("a".to_string()), None])]);
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        assert_eq!(
            parse_records("a\n\"open,b\n").unwrap_err(),
            CodecError::UnterminatedQuote {
                line: 2
            }
        );
        assert!(matches!(parse_records("a\"b\n"), Err(CodecError::StrayQuote { line: 1 })));
        assert!(matches!(
            parse_records("\"a\"b\n"),
            Err(CodecError::TrailingCharacter { found: 'b', .. })
        ));
    }
}

//! Low-level byte-by-byte parser for ASCII text.
//!
//! This module provides [ByteParser] with support for peeking, consuming,
//! comment skipping and quote-aware label parsing. It is the foundation of
//! the Newick reader.

use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser over an owned in-memory buffer.
///
/// # Features
/// - Whitespace and `[...]` comment skipping
/// - Quote-aware label parsing (single quotes with `''` escaping)
/// - Context extraction for error reporting
///
/// # Example
/// ```
/// use caldate::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("  [comment] (A:1.0,B:1.0);");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b",:;()").unwrap(), "A");
/// ```
pub struct ByteParser {
    /// The owned byte data being parsed
    input: Vec<u8>,
    /// Current position in the input
    pos: usize,
}

impl ByteParser {
    /// Creates a new [ByteParser] by copying the given string.
    pub fn for_str(input: &str) -> Self {
        Self {
            input: input.as_bytes().to_vec(),
            pos: 0,
        }
    }

    /// Peeks at the current byte without consuming it, `None` at EOF.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Gets the current byte and advances the position, `None` at EOF.
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Returns whether the end of data has been reached.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset in the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns up to `k` bytes from the current position as string,
    /// used as error context.
    pub fn get_context_as_string(&self, k: usize) -> String {
        let end = (self.pos + k).min(self.input.len());
        String::from_utf8_lossy(&self.input[self.pos..end]).into_owned()
    }

    /// Skips (consumes) all consecutive whitespace characters.
    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Skips (consumes) a `[...]` comment if present.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    /// * `Err(ParsingError)` - Comment was opened but never closed
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if !self.consume_if(b'[') {
            return Ok(false);
        }
        while let Some(b) = self.next_byte() {
            if b == b']' {
                return Ok(true);
            }
        }
        Err(ParsingError::unclosed_comment(self))
    }

    /// Skips (consumes) all consecutive whitespace and comments.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    /// Checks if the current byte equals `ch`.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Consumes the current byte if it equals `ch`.
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Parses a label (quoted or unquoted) with the given delimiter set,
    /// skipping leading whitespace and comments.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek_is(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a label enclosed in single quotes; `''` inside the label
    /// stands for a single quote.
    ///
    /// # Errors
    /// Returns an error if the closing quote is missing.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next_byte(); // opening '

        let mut label = String::new();
        while let Some(b) = self.next_byte() {
            if b != b'\'' {
                label.push(b as char);
            } else if self.consume_if(b'\'') {
                label.push('\'');
            } else {
                return Ok(label);
            }
        }

        Err(ParsingError::unclosed_quote(self))
    }

    /// Parses an unquoted label until any of the given delimiters or EOF.
    /// Underscores are read as spaces.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let mut label = String::new();
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            label.push(if b == b'_' { ' ' } else { b as char });
            self.pos += 1;
        }
        label
    }

    /// Parses a floating point number (digits, sign, `.`, exponent).
    ///
    /// # Returns
    /// * `Ok(value)` - The parsed number
    /// * `Err(ParsingError)` - If no valid number starts at the position
    pub fn parse_number(&mut self) -> Result<f64, ParsingError> {
        let start = self.pos;
        while let Some(b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E') = self.peek() {
            self.pos += 1;
        }

        let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        text.parse().map_err(|_| {
            ParsingError::invalid_newick_string(self, format!("Invalid number: '{}'", text))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_label_with_escaped_quote() {
        let mut parser = ByteParser::for_str("'Baillon''s Crake':1.0");
        assert_eq!(parser.parse_label(b":,").unwrap(), "Baillon's Crake");
        assert!(parser.peek_is(b':'));
    }

    #[test]
    fn unclosed_quote_is_error() {
        let mut parser = ByteParser::for_str("'Pukeko");
        assert!(parser.parse_label(b":,").is_err());
    }

    #[test]
    fn unquoted_label_reads_underscores_as_spaces() {
        let mut parser = ByteParser::for_str("Australasian_Swamphen:2");
        assert_eq!(parser.parse_label(b":").unwrap(), "Australasian Swamphen");
    }

    #[test]
    fn nested_comments_and_whitespace() {
        let mut parser = ByteParser::for_str(" [a] \n [b]x");
        parser.skip_comment_and_whitespace().unwrap();
        assert_eq!(parser.peek(), Some(b'x'));
    }

    #[test]
    fn unclosed_comment_is_error() {
        let mut parser = ByteParser::for_str("[never closed");
        assert!(parser.skip_comment_and_whitespace().is_err());
    }

    #[test]
    fn numbers_in_scientific_notation() {
        let mut parser = ByteParser::for_str("2.5E+3,");
        assert_eq!(parser.parse_number().unwrap(), 2500.0);
        assert!(parser.peek_is(b','));

        let mut parser = ByteParser::for_str("abc");
        assert!(parser.parse_number().is_err());
    }
}

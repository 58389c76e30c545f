//! Error types for the Newick reader.
//!
//! This module provides [ParsingError] and [ParsingErrorType] for
//! representing and reporting errors that occur while reading dated trees.

use crate::parser::byte_parser::ByteParser;
use std::fmt;
use thiserror::Error;

/// Default length of context provided by error from parser
const DEFAULT_CONTEXT_LENGTH: usize = 50;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================#=
/// Error types that can occur while reading a dated Newick tree.
#[derive(PartialEq, Debug, Clone, Error)]
pub enum ParsingErrorType {
    #[error("Unexpected end of input")]
    UnexpectedEOF,
    #[error("Unclosed comment")]
    UnclosedComment,
    #[error("Unclosed quoted label")]
    UnclosedQuote,
    #[error("Invalid newick string: {0}")]
    InvalidNewickString(String),
    #[error("Missing branch length for '{0}'")]
    MissingBranchLength(String),
    #[error("Negative branch length {0}")]
    NegativeBranchLength(f64),
    #[error("Tree is not ultrametric - leaf '{label}' ends at time {time}")]
    NotUltrametric { label: String, time: f64 },
    #[error("Duplicate leaf label '{0}'")]
    DuplicateLabel(String),
    #[error("Tree needs at least two leaves")]
    TooFewLeaves,
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================#=
/// Parsing error with contextual information (position and surrounding bytes).
#[derive(Debug)]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

impl ParsingError {
    /// Create a ParsingError from an error type and parser state
    pub fn from_parser(kind: ParsingErrorType, parser: &ByteParser) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.get_context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Convenience constructor for UnexpectedEOF
    pub fn unexpected_eof(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnexpectedEOF, parser)
    }

    /// Convenience constructor for UnclosedComment
    pub fn unclosed_comment(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedComment, parser)
    }

    /// Convenience constructor for UnclosedQuote
    pub fn unclosed_quote(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedQuote, parser)
    }

    /// Convenience constructor for InvalidNewickString
    pub fn invalid_newick_string(parser: &ByteParser, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNewickString(msg), parser)
    }

    /// Create a ParsingError without parser context (for checks after
    /// the whole string has been read)
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self {
            kind,
            position: 0,
            context: String::new(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Get the position where the error occurred
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at position {}", self.kind, self.position)?;

        if !self.context.is_empty() {
            write!(
                f,
                "\n  Context (next {} bytes): {}",
                self.context.len(),
                self.context
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for ParsingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

//! Basic low-level byte parser functionality used by the Newick reader,
//! along with its error type.

pub mod byte_parser;
pub mod parsing_error;

pub use byte_parser::ByteParser;
pub use parsing_error::{ParsingError, ParsingErrorType};

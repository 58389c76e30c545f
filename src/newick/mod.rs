//! Newick reader and writer for dated (ultrametric) binary trees.
//!
//! # Quick API
//! * [`parse_dated_str`] - parses a single tree, returns [DatedTree] +
//!   [LeafLabelMap]
//! * [`to_newick`] - writes a [DatedTree] back with branch lengths derived
//!   from its times
//!
//! # Format
//! The Newick format has the following simple grammar:
//! * `tree ::= vertex ';'`
//! * `vertex ::= leaf | internal_vertex`
//! * `internal_vertex ::= '(' vertex ',' vertex ')' [branch_length]`
//! * `leaf ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Furthermore:
//! * Whitespace can occur between elements,
//!   just not within an unquoted label or a branch_length
//! * Comments are square brackets and can occur anywhere where whitespace
//!   is allowed; annotations such as `[&R]` are skipped as comments
//! * Every non-root vertex needs a branch length; the root's is ignored
//!
//! # Times
//! The root gets time `-height`, where `height` is the largest root-to-leaf
//! distance, and every other vertex the time of its parent plus its branch
//! length. Leaves must end at time `0` up to the shared tolerance.

mod reader;
mod writer;

pub use reader::DatedNewickReader;
pub use writer::to_newick;

use crate::model::{DatedTree, LeafLabelMap};
use crate::parser::{ByteParser, ParsingError};

/// Parses a single dated Newick string.
///
/// # Example
/// ```
/// use caldate::newick::parse_dated_str;
///
/// let (tree, labels) = parse_dated_str("((A:1,B:1):1,C:2);").unwrap();
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(tree.root_time(), -2.0);
/// assert!(labels.contains_label("C"));
/// ```
pub fn parse_dated_str(newick: &str) -> Result<(DatedTree, LeafLabelMap), ParsingError> {
    let mut parser = ByteParser::for_str(newick);
    DatedNewickReader::new().parse(&mut parser)
}

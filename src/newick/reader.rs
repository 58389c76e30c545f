//! Reader for dated (ultrametric) binary Newick trees.

use crate::dating::tolerance::approx_eq;
use crate::model::leaf_label_map::{LabelIndex, LeafLabelMap};
use crate::model::tree::{DatedTree, VertexIndex};
use crate::parser::byte_parser::ByteParser;
use crate::parser::parsing_error::{ParsingError, ParsingErrorType};

/// Newick label delimiters: parentheses, comma, colon, semicolon, whitespace
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"([,:; \n\t\r)]";

/// Default guess for number of leaves, when unknown
const DEFAULT_NUM_LEAVES_GUESS: usize = 10;

/// A vertex as read from the string, before times are known.
#[derive(Debug)]
enum RawVertex {
    Leaf {
        label: LabelIndex,
        branch_length: Option<f64>,
    },
    Internal {
        children: (VertexIndex, VertexIndex),
        branch_length: Option<f64>,
    },
}

impl RawVertex {
    fn branch_length(&self) -> Option<f64> {
        match self {
            RawVertex::Leaf { branch_length, .. } | RawVertex::Internal { branch_length, .. } => *branch_length,
        }
    }
}

/// Reader for a single binary Newick tree with branch lengths, producing a
/// [DatedTree] and its [LeafLabelMap].
///
/// Vertices are collected bottom-up while reading. Once the whole string is
/// consumed, depths are accumulated from the root, the tree height is the
/// largest leaf depth and every vertex gets time `depth - height`. All
/// leaves must end at the present within tolerance.
///
/// # Example
/// ```
/// use caldate::newick::DatedNewickReader;
/// use caldate::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("((A:1,B:1):2,C:3);");
/// let (tree, labels) = DatedNewickReader::new().parse(&mut parser).unwrap();
/// assert_eq!(tree.root_time(), -3.0);
/// assert_eq!(labels.num_labels(), 3);
/// ```
#[derive(Debug, Default)]
pub struct DatedNewickReader {
    labels: LeafLabelMap,
    vertices: Vec<RawVertex>,
}

impl DatedNewickReader {
    /// Creates a new reader with an empty label map.
    pub fn new() -> Self {
        Self {
            labels: LeafLabelMap::new(DEFAULT_NUM_LEAVES_GUESS),
            vertices: Vec::with_capacity(2 * DEFAULT_NUM_LEAVES_GUESS - 1),
        }
    }

    /// Reads one tree terminated by `;` and consumes the reader.
    ///
    /// # Errors
    /// * Syntax errors with position and context
    /// * [ParsingErrorType::MissingBranchLength] for a non-root vertex
    ///   without branch length
    /// * [ParsingErrorType::NegativeBranchLength]
    /// * [ParsingErrorType::DuplicateLabel]
    /// * [ParsingErrorType::NotUltrametric] if a leaf does not end at the
    ///   present
    pub fn parse(mut self, parser: &mut ByteParser) -> Result<(DatedTree, LeafLabelMap), ParsingError> {
        self.parse_root(parser)?;
        let tree = self.build_dated_tree()?;
        Ok((tree, self.labels))
    }

    /// Parses root of tree: `(left, right)[:branch_length];`
    ///
    /// A root branch length is allowed but ignored.
    fn parse_root(&mut self, parser: &mut ByteParser) -> Result<(), ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.peek_is(b'(') {
            return Err(ParsingError::from_parser(ParsingErrorType::TooFewLeaves, parser));
        }

        let children = self.parse_children(parser)?;
        let _ = self.parse_branch_length(parser)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }

        self.vertices.push(RawVertex::Internal {
            children,
            branch_length: None,
        });
        Ok(())
    }

    /// Parses a vertex (either internal vertex or leaf) and returns its
    /// index, dispatching on a leading `(`.
    fn parse_vertex(&mut self, parser: &mut ByteParser) -> Result<VertexIndex, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if parser.peek_is(b'(') {
            self.parse_internal_vertex(parser)
        } else {
            self.parse_leaf(parser)
        }
    }

    /// Parses `(left, right):branch_length`.
    fn parse_internal_vertex(&mut self, parser: &mut ByteParser) -> Result<VertexIndex, ParsingError> {
        let children = self.parse_children(parser)?;
        let branch_length = self.parse_branch_length(parser)?;

        let index = self.vertices.len();
        self.vertices.push(RawVertex::Internal { children, branch_length });
        Ok(index)
    }

    /// Parses children pair `(left, right)` and returns their indices.
    fn parse_children(&mut self, parser: &mut ByteParser) -> Result<(VertexIndex, VertexIndex), ParsingError> {
        if !parser.consume_if(b'(') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected '(' before children but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }
        let left = self.parse_vertex(parser)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b',') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ',' between children but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }
        let right = self.parse_vertex(parser)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b')') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ')' after children (binary trees only) but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }

        Ok((left, right))
    }

    /// Parses `label:branch_length`.
    fn parse_leaf(&mut self, parser: &mut ByteParser) -> Result<VertexIndex, ParsingError> {
        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        if label.is_empty() {
            return Err(ParsingError::invalid_newick_string(parser, "Empty leaf label".to_string()));
        }
        if self.labels.contains_label(&label) {
            return Err(ParsingError::from_parser(ParsingErrorType::DuplicateLabel(label), parser));
        }
        let label_index = self.labels.get_or_insert(&label);
        let branch_length = self.parse_branch_length(parser)?;

        let index = self.vertices.len();
        self.vertices.push(RawVertex::Leaf {
            label: label_index,
            branch_length,
        });
        Ok(index)
    }

    /// Parses optional branch length `[:number]`, skipping comments and
    /// whitespace around `:`.
    fn parse_branch_length(&mut self, parser: &mut ByteParser) -> Result<Option<f64>, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b':') {
            return Ok(None);
        }
        parser.skip_comment_and_whitespace()?;

        let value = parser.parse_number()?;
        if value < 0.0 {
            return Err(ParsingError::from_parser(ParsingErrorType::NegativeBranchLength(value), parser));
        }
        if !value.is_finite() {
            return Err(ParsingError::invalid_newick_string(parser, format!("Branch length {} is not finite", value)));
        }
        Ok(Some(value))
    }

    /// Converts the collected vertices into a [DatedTree].
    ///
    /// Children always precede their parent in `vertices` and the root is
    /// last, so adding them in order reproduces the same indices.
    fn build_dated_tree(&self) -> Result<DatedTree, ParsingError> {
        let root = self.vertices.len() - 1;
        let mut depth = vec![0.0; self.vertices.len()];
        for parent in (0..self.vertices.len()).rev() {
            if let RawVertex::Internal { children: (left, right), .. } = self.vertices[parent] {
                for child in [left, right] {
                    let branch_length = self.vertices[child]
                        .branch_length()
                        .ok_or_else(|| self.missing_branch_length(child))?;
                    depth[child] = depth[parent] + branch_length;
                }
            }
        }

        let height = self
            .vertices
            .iter()
            .zip(&depth)
            .filter(|(v, _)| matches!(v, RawVertex::Leaf { .. }))
            .map(|(_, &d)| d)
            .fold(0.0, f64::max);

        let mut tree = DatedTree::new(self.vertices.len().div_ceil(2));
        for (index, vertex) in self.vertices.iter().enumerate() {
            let time = (depth[index] - height).min(0.0);
            let added = match *vertex {
                RawVertex::Leaf { label, .. } => {
                    if !approx_eq(depth[index], height) {
                        return Err(ParsingError::without_context(ParsingErrorType::NotUltrametric {
                            label: self.labels[label].to_string(),
                            time,
                        }));
                    }
                    tree.add_leaf(label)
                }
                RawVertex::Internal { children, .. } if index == root => tree.add_root(children, -height),
                RawVertex::Internal { children, .. } => tree.add_internal(children, time),
            };
            debug_assert_eq!(added, index);
        }

        if !tree.check_node_height_ordering() {
            return Err(ParsingError::without_context(ParsingErrorType::InvalidNewickString(
                "Branch lengths of internal branches must be positive".to_string(),
            )));
        }

        Ok(tree)
    }

    fn missing_branch_length(&self, index: VertexIndex) -> ParsingError {
        let name = match self.vertices[index] {
            RawVertex::Leaf { label, .. } => self.labels[label].to_string(),
            RawVertex::Internal { .. } => format!("internal vertex {}", index),
        };
        ParsingError::without_context(ParsingErrorType::MissingBranchLength(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(newick: &str) -> Result<(DatedTree, LeafLabelMap), ParsingError> {
        DatedNewickReader::new().parse(&mut ByteParser::for_str(newick))
    }

    #[test]
    fn times_from_branch_lengths() {
        let (tree, labels) = read("((A:1.5,B:1.5):2.5,(C:3,D:3):1);").unwrap();
        assert!(tree.is_valid());
        assert_eq!(tree.root_time(), -4.0);
        let a = tree.leaf_with_label(labels.get_index("A").unwrap()).unwrap();
        let c = tree.leaf_with_label(labels.get_index("C").unwrap()).unwrap();
        assert_eq!(tree.time(tree.parent(a).unwrap()), -1.5);
        assert_eq!(tree.time(tree.parent(c).unwrap()), -3.0);
        assert_eq!(tree.time(a), 0.0);
    }

    #[test]
    fn comments_and_root_branch_length_are_skipped() {
        let (tree, _) = read(" [&R] ( A:1 [x], 'B c':1 ):0.0 ;").unwrap();
        assert_eq!(tree.root_time(), -1.0);
        assert_eq!(tree.num_leaves(), 2);
    }

    #[test]
    fn missing_branch_length() {
        let err = read("((A:1,B):1,C:2);").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::MissingBranchLength("B".to_string()));
    }

    #[test]
    fn not_ultrametric() {
        let err = read("((A:1,B:1):1,C:3);").unwrap_err();
        assert!(matches!(err.kind(), ParsingErrorType::NotUltrametric { .. }));
    }

    #[test]
    fn duplicate_label() {
        let err = read("((A:1,A:1):1,C:2);").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::DuplicateLabel("A".to_string()));
    }

    #[test]
    fn zero_length_internal_branch() {
        let err = read("((A:1,B:1):0,C:1);").unwrap_err();
        assert!(matches!(err.kind(), ParsingErrorType::InvalidNewickString(_)));
    }

    #[test]
    fn single_leaf_is_rejected() {
        let err = read("A:1;").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::TooFewLeaves);
    }

    #[test]
    fn negative_branch_length() {
        let err = read("(A:-1,B:1);").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::NegativeBranchLength(-1.0));
    }
}

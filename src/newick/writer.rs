//! Newick writing of dated trees.

use crate::model::leaf_label_map::LeafLabelMap;
use crate::model::tree::{DatedTree, VertexIndex};

/// Extra buffer in Newick string length/capacity estimate
const BUFFER_CHARS: usize = 10;

/// Estimated characters per vertex: label or `(,)` plus `:` and a branch
/// length such as `0.009529961339106089`
const CHARS_PER_VERTEX: usize = 24;

/// Writes a [DatedTree] as Newick string, terminated by `;`.
///
/// Branch lengths are derived from the vertex times (`time(child) -
/// time(parent)`); the root has none. Leaf labels are looked up in
/// `labels` and quoted if necessary; a leaf whose label index is unknown
/// to the map is written with its index.
///
/// # Example
/// ```
/// use caldate::newick::{parse_dated_str, to_newick};
///
/// let (tree, labels) = parse_dated_str("((A:1,B:1):2,C:3);").unwrap();
/// assert_eq!(to_newick(&tree, &labels), "((A:1,B:1):2,C:3);");
/// ```
pub fn to_newick(tree: &DatedTree, labels: &LeafLabelMap) -> String {
    fn build_newick(tree: &DatedTree, labels: &LeafLabelMap, newick: &mut String, index: VertexIndex) {
        match tree.children(index) {
            None => {
                match tree[index].label().and_then(|l| labels.get_label(l)) {
                    Some(label) => newick.push_str(&escape_label(label)),
                    None => newick.push_str(&index.to_string()),
                }
            }
            Some((left, right)) => {
                newick.push('(');
                build_newick(tree, labels, newick, left);
                newick.push(',');
                build_newick(tree, labels, newick, right);
                newick.push(')');
            }
        }

        if let Some(parent) = tree.parent(index) {
            newick.push(':');
            newick.push_str(&(tree.time(index) - tree.time(parent)).to_string());
        }
    }

    let mut newick = String::with_capacity(tree.num_vertices() * CHARS_PER_VERTEX + BUFFER_CHARS);
    if tree.is_root_set() {
        build_newick(tree, labels, &mut newick, tree.root_index());
    }
    newick.push(';');
    newick
}

/// Quotes a label if it contains Newick delimiters, doubling inner quotes.
fn escape_label(label: &str) -> String {
    if label
        .chars()
        .any(|c| matches!(c, ' ' | ',' | ';' | '\t' | '\n' | '\r' | '(' | ')' | ':' | '[' | ']' | '\'' | '_'))
    {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_label_quotes_when_needed() {
        assert_eq!(escape_label("Kea"), "Kea");
        assert_eq!(escape_label("Nestor notabilis"), "'Nestor notabilis'");
        assert_eq!(escape_label("Baillon's"), "'Baillon''s'");
        assert_eq!(escape_label("a_b"), "'a_b'");
    }
}

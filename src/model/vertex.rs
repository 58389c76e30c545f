//! Vertex type of the dated tree arena.

use crate::model::leaf_label_map::LabelIndex;
use crate::model::tree::VertexIndex;

/// During construction, Internal and Leaf vertex might not have parent set yet.
const NO_PARENT_SET: VertexIndex = usize::MAX;

// =#========================================================================#=
// VERTEX
// =#========================================================================#=
/// Represents a vertex (node) of a dated binary tree.
///
/// A vertex can be either:
/// - **Root**: Has two children, no parent
/// - **Internal**: Has two children and a parent
/// - **Leaf**: Has no children, a parent and a label (via [LabelIndex])
///
/// Vertices carry topology only. Times live in a parallel array of the
/// owning [DatedTree](crate::model::DatedTree), so that re-timing a tree
/// never touches the arena.
///
/// # Invariants
/// - `index` is the position of the vertex in the arena
/// - Internal vertices and leaves have `parent` set once the tree is
///   complete; `NO_PARENT_SET = usize::MAX` only during construction
#[derive(PartialEq, Debug, Clone)]
pub enum Vertex {
    /// Root vertex of the tree (has no parent, has two children)
    Root {
        /// Index of this vertex in the tree arena
        index: VertexIndex,
        /// Indices of the two child vertices
        children: (VertexIndex, VertexIndex),
    },
    /// Internal vertex (has parent and two children, no label)
    Internal {
        /// Index of this vertex in the tree arena
        index: VertexIndex,
        /// Index of the parent vertex
        parent: VertexIndex,
        /// Indices of the two child vertices
        children: (VertexIndex, VertexIndex),
    },
    /// Leaf vertex (has parent and label, no children)
    Leaf {
        /// Index of this vertex in the tree arena
        index: VertexIndex,
        /// Index of the parent vertex
        parent: VertexIndex,
        /// Index into the shared [LeafLabelMap](crate::model::LeafLabelMap)
        label: LabelIndex,
    },
}

impl Vertex {
    /// Creates a new root vertex.
    pub fn new_root(index: VertexIndex, children: (VertexIndex, VertexIndex)) -> Self {
        Vertex::Root { index, children }
    }

    /// Creates a new internal (non-leaf, non-root) vertex without parent.
    pub fn new_internal(index: VertexIndex, children: (VertexIndex, VertexIndex)) -> Self {
        Vertex::Internal {
            index,
            parent: NO_PARENT_SET,
            children,
        }
    }

    /// Creates a new leaf vertex without parent.
    pub fn new_leaf(index: VertexIndex, label: LabelIndex) -> Self {
        Vertex::Leaf {
            index,
            parent: NO_PARENT_SET,
            label,
        }
    }

    /// Returns the arena index of this vertex.
    pub fn index(&self) -> VertexIndex {
        match self {
            Vertex::Root { index, .. }
            | Vertex::Internal { index, .. }
            | Vertex::Leaf { index, .. } => *index,
        }
    }

    /// Returns the label index if this is a leaf, else `None`.
    pub fn label(&self) -> Option<LabelIndex> {
        match self {
            Vertex::Leaf { label, .. } => Some(*label),
            _ => None,
        }
    }

    /// Returns `true` if this vertex is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Vertex::Leaf { .. })
    }

    /// Returns `true` if this vertex is an internal (non-root) vertex.
    pub fn is_internal(&self) -> bool {
        matches!(self, Vertex::Internal { .. })
    }

    /// Returns `true` if this vertex is the root.
    pub fn is_root(&self) -> bool {
        matches!(self, Vertex::Root { .. })
    }

    /// Returns the children if this is the root or an internal vertex,
    /// else `None`.
    pub fn children(&self) -> Option<(VertexIndex, VertexIndex)> {
        match self {
            Vertex::Root { children, .. } | Vertex::Internal { children, .. } => Some(*children),
            Vertex::Leaf { .. } => None,
        }
    }

    /// Returns the index of the parent if this is a non-root vertex whose
    /// parent has been set, else `None`.
    pub fn parent(&self) -> Option<VertexIndex> {
        match self {
            Vertex::Internal { parent, .. } | Vertex::Leaf { parent, .. } => {
                (*parent != NO_PARENT_SET).then_some(*parent)
            }
            Vertex::Root { .. } => None,
        }
    }

    /// Sets new parent for non-root vertex.
    ///
    /// # Panics
    /// Panics if called on root.
    pub(crate) fn set_parent(&mut self, parent: VertexIndex) {
        match self {
            Vertex::Root { .. } => panic!("Cannot set parent on root vertex"),
            Vertex::Internal { parent: p, .. } | Vertex::Leaf { parent: p, .. } => *p = parent,
        }
    }
}

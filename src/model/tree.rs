//! Provides the dated, ranked tree representation.
//!
//! * [DatedTree] - binary tree stored with the arena pattern, a parallel
//!   array of node times and the rank order of its internal vertices
//! * [VertexIndex] as type used to index vertices in tree
//!
//! # Time axis
//! Times are signed: the present is `0.0` and the past is negative, so the
//! root carries the most negative time. A vertex `u` is *older* than `v`
//! iff `time(u) < time(v)`.

use crate::model::leaf_label_map::LabelIndex;
use crate::model::vertex::Vertex;

/// Index of a vertex in a tree (arena).
pub type VertexIndex = usize;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: VertexIndex = usize::MAX;

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A binary, rooted, dated tree represented using the arena pattern on
/// [Vertex].
///
/// Vertices are stored in a contiguous vector and referenced by
/// [VertexIndex]; node times live in a parallel vector of the same length.
///
/// # Structure
/// - All vertices (root, internal, and leaves) are stored in the arena.
/// - No assumption on order of indices is maintained.
/// - `rank` lists the `n-1` non-leaf vertices from oldest to youngest:
///   rank `0` is the root, rank `1` the oldest non-root internal vertex and
///   rank `n-2` the youngest internal vertex. Ties are broken root first,
///   then by index, so the order is a deterministic total order.
///
/// # Construction
/// Add leaves and internal vertices bottom-up, finish with
/// [`add_root`](Self::add_root), which also computes the rank order.
/// After changing times via [`set_time`](Self::set_time), call
/// [`update_node_ordering`](Self::update_node_ordering).
///
/// # Example
/// ```
/// use caldate::model::DatedTree;
///
/// let mut tree = DatedTree::new(3);
/// let a = tree.add_leaf(0);
/// let b = tree.add_leaf(1);
/// let c = tree.add_leaf(2);
/// let ab = tree.add_internal((a, b), -1.0);
/// let root = tree.add_root((ab, c), -3.0);
///
/// assert_eq!(tree.rank(), &[root, ab]);
/// assert!(tree.check_node_height_ordering());
/// ```
#[derive(Debug, Clone)]
pub struct DatedTree {
    /// Number of leaves the tree was initialised for
    num_leaves_init: usize,

    /// Vertices of this tree (arena pattern)
    vertices: Vec<Vertex>,

    /// Time of each vertex, parallel to `vertices`
    times: Vec<f64>,

    /// Non-leaf vertices, oldest first
    rank: Vec<VertexIndex>,

    /// Index of the root of this tree
    root_index: VertexIndex,
}

// ============================================================================
// Construction (pub)
// ============================================================================
impl DatedTree {
    /// Creates a new tree with capacity for a binary tree with `num_leaves`
    /// leaves.
    ///
    /// # Panics
    /// Panics if `num_leaves < 2`.
    pub fn new(num_leaves: usize) -> Self {
        assert!(num_leaves >= 2, "A rooted binary tree needs at least two leaves");
        let capacity = 2 * num_leaves - 1;
        DatedTree {
            num_leaves_init: num_leaves,
            vertices: Vec::with_capacity(capacity),
            times: Vec::with_capacity(capacity),
            rank: Vec::with_capacity(num_leaves - 1),
            root_index: NO_ROOT_SET_INDEX,
        }
    }

    /// Adds a leaf at the present (time `0.0`) and returns its index.
    pub fn add_leaf(&mut self, label: LabelIndex) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_leaf(index, label));
        self.times.push(0.0);
        index
    }

    /// Adds an internal vertex with the given children and time and returns
    /// its index.
    ///
    /// # Panics
    /// Panics if `time` is not finite or positive.
    pub fn add_internal(&mut self, children: (VertexIndex, VertexIndex), time: f64) -> VertexIndex {
        assert_valid_time(time);
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_internal(index, children));
        self.times.push(time);
        self.vertices[children.0].set_parent(index);
        self.vertices[children.1].set_parent(index);
        index
    }

    /// Adds the root with the given children and time, computes the rank
    /// order and returns the root index.
    ///
    /// # Panics
    /// Panics if `time` is not finite or positive.
    pub fn add_root(&mut self, children: (VertexIndex, VertexIndex), time: f64) -> VertexIndex {
        assert_valid_time(time);
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_root(index, children));
        self.times.push(time);
        self.root_index = index;
        self.vertices[children.0].set_parent(index);
        self.vertices[children.1].set_parent(index);
        self.update_node_ordering();
        index
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl DatedTree {
    /// Returns whether root of tree has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index != NO_ROOT_SET_INDEX
    }

    /// Returns the index of the root.
    pub fn root_index(&self) -> VertexIndex {
        self.root_index
    }

    /// Returns a reference to the root vertex.
    ///
    /// # Panics
    /// Panics if the root hasn't been set yet.
    pub fn root(&self) -> &Vertex {
        &self[self.root_index]
    }

    /// Returns a reference to the vertex at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self[index]
    }

    /// Returns the number of leaves this tree was initialised to hold.
    pub fn num_leaves_init(&self) -> usize {
        self.num_leaves_init
    }

    /// Returns the number of leaves in this tree.
    pub fn num_leaves(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_leaf()).count()
    }

    /// Returns the number of internal (non-root, non-leaf) vertices.
    pub fn num_internal(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_internal()).count()
    }

    /// Returns the number of vertices in this tree.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the time of a vertex.
    pub fn time(&self, index: VertexIndex) -> f64 {
        self.times[index]
    }

    /// Returns the times of all vertices, indexed by [VertexIndex].
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Returns the time of the root, i.e. the most negative time.
    pub fn root_time(&self) -> f64 {
        self.times[self.root_index]
    }

    /// Sets the time of a vertex. The rank order is *not* updated.
    ///
    /// # Panics
    /// Panics if `time` is not finite or positive.
    pub fn set_time(&mut self, index: VertexIndex, time: f64) {
        assert_valid_time(time);
        self.times[index] = time;
    }

    /// Returns the non-leaf vertices from oldest (root) to youngest.
    pub fn rank(&self) -> &[VertexIndex] {
        &self.rank
    }

    /// Returns the youngest internal vertex, if the tree has more than the
    /// root as non-leaf vertex.
    pub fn youngest_internal(&self) -> Option<VertexIndex> {
        (self.rank.len() > 1).then(|| self.rank[self.rank.len() - 1])
    }

    /// Returns the parent of a vertex, `None` for the root.
    pub fn parent(&self, index: VertexIndex) -> Option<VertexIndex> {
        self[index].parent()
    }

    /// Returns the children of a vertex, `None` for leaves.
    pub fn children(&self, index: VertexIndex) -> Option<(VertexIndex, VertexIndex)> {
        self[index].children()
    }

    /// Returns the other child of `index`'s parent, `None` for the root.
    pub fn sibling(&self, index: VertexIndex) -> Option<VertexIndex> {
        let parent = self.parent(index)?;
        let (left, right) = self.children(parent)?;
        Some(if left == index { right } else { left })
    }

    /// Returns the leaf carrying the given label, if any.
    pub fn leaf_with_label(&self, label: LabelIndex) -> Option<VertexIndex> {
        self.vertices
            .iter()
            .find(|v| v.label() == Some(label))
            .map(Vertex::index)
    }

    /// Returns whether `ancestor` lies on the path from `index` to the root
    /// (`index` itself included).
    pub fn is_ancestor_or_self(&self, ancestor: VertexIndex, index: VertexIndex) -> bool {
        let mut current = Some(index);
        while let Some(v) = current {
            if v == ancestor {
                return true;
            }
            current = self.parent(v);
        }
        false
    }

    /// Returns the path from `index` up to and including the root.
    pub fn path_to_root(&self, index: VertexIndex) -> Vec<VertexIndex> {
        let mut path = vec![index];
        let mut current = index;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path
    }

    /// Returns the last common ancestor of the given vertices,
    /// `None` if `vertices` is empty.
    pub fn lca(&self, vertices: &[VertexIndex]) -> Option<VertexIndex> {
        let (&first, rest) = vertices.split_first()?;
        let mut on_path = vec![false; self.num_vertices()];
        for v in self.path_to_root(first) {
            on_path[v] = true;
        }

        let mut lca = first;
        for &other in rest {
            // Climb from `other` to the first vertex on the current LCA path,
            // then shrink the path to everything at or above that vertex.
            let mut meet = other;
            while !on_path[meet] {
                match self.parent(meet) {
                    Some(parent) => meet = parent,
                    None => return None,
                }
            }
            let mut below = lca;
            while below != meet {
                on_path[below] = false;
                below = self.parent(below)?;
            }
            lca = meet;
        }
        Some(lca)
    }

    /// Returns all leaves in the subtree rooted at `index`.
    pub fn leaves_below(&self, index: VertexIndex) -> Vec<VertexIndex> {
        self.pre_order_from(index)
            .filter(|&v| self[v].is_leaf())
            .collect()
    }
}

// ============================================================================
// Ranking and validity (pub)
// ============================================================================
impl DatedTree {
    /// Recomputes the rank order of the non-leaf vertices from the current
    /// times (oldest first, root first on ties, then by index).
    pub fn update_node_ordering(&mut self) {
        let root = self.root_index;
        let times = &self.times;
        self.rank.clear();
        self.rank.extend(
            self.vertices
                .iter()
                .filter(|v| !v.is_leaf())
                .map(Vertex::index),
        );
        self.rank.sort_by(|&a, &b| {
            times[a]
                .total_cmp(&times[b])
                .then_with(|| (b == root).cmp(&(a == root)))
                .then_with(|| a.cmp(&b))
        });
    }

    /// Checks that every non-root vertex is strictly younger than its
    /// parent.
    pub fn check_node_height_ordering(&self) -> bool {
        self.vertices.iter().all(|v| match v.parent() {
            Some(parent) => self.times[parent] < self.times[v.index()],
            None => v.is_root(),
        })
    }

    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root index is set, valid and points to a Root vertex
    /// - All vertex indices match their position in the arena
    /// - Children point back to their parent and vice versa
    /// - Binary tree vertex count for the number of leaves
    /// - Times are finite, not positive and strictly increasing from root
    ///   to leaves
    pub fn is_valid(&self) -> bool {
        if !self.is_root_set() || self.root_index >= self.vertices.len() {
            return false;
        }
        if !self.vertices[self.root_index].is_root() {
            return false;
        }

        let mut leaf_count = 0;
        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.index() != index {
                return false;
            }
            if vertex.is_root() && index != self.root_index {
                return false;
            }
            if vertex.is_leaf() {
                leaf_count += 1;
            }

            if let Some((left, right)) = vertex.children() {
                if left >= self.vertices.len() || right >= self.vertices.len() {
                    return false;
                }
                if self.vertices[left].parent() != Some(index)
                    || self.vertices[right].parent() != Some(index)
                {
                    return false;
                }
            }

            if !vertex.is_root() {
                match vertex.parent().and_then(|p| self.children(p)) {
                    Some((left, right)) if left == index || right == index => {}
                    _ => return false,
                }
            }

            let time = self.times[index];
            if !time.is_finite() || time > 0.0 {
                return false;
            }
        }

        leaf_count == self.vertices.len().div_ceil(2) && self.check_node_height_ordering()
    }
}

impl std::ops::Index<VertexIndex> for DatedTree {
    type Output = Vertex;

    fn index(&self, index: VertexIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

fn assert_valid_time(time: f64) {
    assert!(time.is_finite(), "Vertex time must be finite, got {}", time);
    assert!(time <= 0.0, "Vertex time must not lie in the future, got {}", time);
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
impl DatedTree {
    /// Returns an iterator over the vertex indices of the whole tree in
    /// pre-order (parents before children, left before right).
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self, self.is_root_set().then_some(self.root_index))
    }

    /// Returns an iterator over the subtree rooted at `index` in pre-order,
    /// `index` included.
    pub fn pre_order_from(&self, index: VertexIndex) -> PreOrderIter<'_> {
        PreOrderIter::new(self, Some(index))
    }

    /// Returns an iterator over the vertex indices in post-order
    /// (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// Stack based, so deep caterpillar trees do not recurse.
pub struct PreOrderIter<'a> {
    tree: &'a DatedTree,
    stack: Vec<VertexIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a DatedTree, start: Option<VertexIndex>) -> Self {
        PreOrderIter {
            tree,
            stack: start.into_iter().collect(),
        }
    }
}

impl Iterator for PreOrderIter<'_> {
    type Item = VertexIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;

        // Push children onto stack (right first, so left is processed first)
        if let Some((left, right)) = self.tree.children(index) {
            self.stack.push(right);
            self.stack.push(left);
        }

        Some(index)
    }
}

/// Iterator for post-order traversal (children before parents).
pub struct PostOrderIter<'a> {
    tree: &'a DatedTree,
    stack: Vec<(VertexIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a DatedTree) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push((tree.root_index, false));
        }
        PostOrderIter { tree, stack }
    }
}

impl Iterator for PostOrderIter<'_> {
    type Item = VertexIndex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            match self.tree.children(index) {
                Some((left, right)) if !children_visited => {
                    self.stack.push((index, true));
                    self.stack.push((right, false));
                    self.stack.push((left, false));
                }
                _ => return Some(index),
            }
        }
        None
    }
}

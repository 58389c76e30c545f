//! Data model for dated binary phylogenetic trees.
//!
//! # Tree representation
//! Trees are represented by [DatedTree], which uses the arena pattern to
//! store [Vertex] nodes. Each vertex is either a `Root`, `Internal`, or
//! `Leaf`, referenced by [VertexIndex]. Node times are kept in a parallel
//! array and the non-leaf vertices are ranked from oldest to youngest.
//!
//! # Label handling
//! Leaves store a [LabelIndex] into a [LeafLabelMap], which is shared with
//! the calibrations that name their clades by taxon label.

pub mod leaf_label_map;
pub mod tree;
pub mod vertex;

pub use leaf_label_map::LabelIndex;
pub use leaf_label_map::LeafLabelMap;
pub use tree::DatedTree;
pub use tree::VertexIndex;
pub use vertex::Vertex;

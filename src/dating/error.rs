//! Error type of the dating core.

use crate::config::ConfigError;
use crate::model::VertexIndex;
use crate::parser::ParsingError;
use thiserror::Error;

/// Coarse classification of a [DatingError], telling a sampler how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad calibrations or parameters; fatal before sampling starts.
    Configuration,
    /// A closed-form evaluation under- or overflowed; fatal for the evaluation.
    Numerical,
    /// The current state violates a constraint; reject the proposal.
    ConstraintViolation,
    /// An internal invariant broke.
    Invariant,
}

/// Errors raised while binding calibrations, propagating prior windows,
/// evaluating the ranked prior or enumerating regraft targets.
#[derive(Debug, Error)]
pub enum DatingError {
    #[error("Calibration '{clade_id}' cannot be placed on the tree: {reason}")]
    UnresolvedClade { clade_id: String, reason: String },

    #[error("Vertex {node} carries {count} calibrations, at most {max} are allowed")]
    TooManyCalibrations {
        node: VertexIndex,
        count: usize,
        max: usize,
    },

    #[error(
        "Calibrations on vertex {node} contradict each other: \
         lower bound {max_lower} lies after upper bound {min_upper}"
    )]
    ContradictoryCalibrations {
        node: VertexIndex,
        max_lower: f64,
        min_upper: f64,
    },

    #[error("Invalid birth-death rates (birth {birth}, death {death}): {reason}")]
    InvalidRates { birth: f64, death: f64, reason: String },

    #[error("Invalid calibration '{clade_id}': {reason}")]
    InvalidCalibration { clade_id: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not read tree: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    #[error("Vertex {node} at time {time} lies outside its prior window [{min}, {max}]")]
    TimeConstraintViolation {
        node: VertexIndex,
        time: f64,
        min: f64,
        max: f64,
    },

    #[error("Current rank order leaves an empty prior window [{min}, {max}] on vertex {node}")]
    InconsistentPriorWindow { node: VertexIndex, min: f64, max: f64 },

    #[error("Vertex {node} at rank {rank} has an empty prior window [{min}, {max}]")]
    EmptyPriorWindow {
        node: VertexIndex,
        rank: usize,
        min: f64,
        max: f64,
    },

    #[error("Vertex {prune} is not the parent of vertex {prune_daughter}")]
    InvalidPruneEdge {
        prune: VertexIndex,
        prune_daughter: VertexIndex,
    },

    #[error("Invalid time {time} for vertex {node}: {reason}")]
    InvalidTime {
        node: VertexIndex,
        time: f64,
        reason: String,
    },

    #[error(
        "Split interval {interval} [{lower}, {upper}] straddles the prior window \
         [{min}, {max}] of vertex {node}"
    )]
    SplitStraddlesWindow {
        node: VertexIndex,
        interval: usize,
        lower: f64,
        upper: f64,
        min: f64,
        max: f64,
    },

    #[error(
        "Ran out of split intervals for vertex {node} with prior window [{min}, {max}] \
         (last boundary {last_boundary})"
    )]
    SplitListExhausted {
        node: VertexIndex,
        min: f64,
        max: f64,
        last_boundary: f64,
    },
}

impl DatingError {
    /// Returns the [ErrorKind] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatingError::UnresolvedClade { .. }
            | DatingError::TooManyCalibrations { .. }
            | DatingError::ContradictoryCalibrations { .. }
            | DatingError::InvalidRates { .. }
            | DatingError::InvalidCalibration { .. }
            | DatingError::Config(_)
            | DatingError::Parsing(_) => ErrorKind::Configuration,
            DatingError::NumericalFailure(_) => ErrorKind::Numerical,
            DatingError::TimeConstraintViolation { .. }
            | DatingError::InconsistentPriorWindow { .. }
            | DatingError::EmptyPriorWindow { .. }
            | DatingError::InvalidPruneEdge { .. }
            | DatingError::InvalidTime { .. } => ErrorKind::ConstraintViolation,
            DatingError::SplitStraddlesWindow { .. } | DatingError::SplitListExhausted { .. } => {
                ErrorKind::Invariant
            }
        }
    }

    /// Returns whether a sampler may reject the current proposal and carry on.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::ConstraintViolation
    }
}

//! Caldate is a library for the calibration-constrained time prior of
//! Bayesian molecular dating.
//!
//! Given a dated, ranked binary tree and time calibrations on clades, it
//! offers the pieces a dating MCMC sampler needs:
//! - Calibrations: bind calibrations to the last common ancestor of their
//!   taxa and propagate prior windows along the rank order.
//! - Checks: detect contradicting calibrations (fatal) and times outside
//!   their windows (reject the proposal).
//! - Prior: the exact probability of the ranked topology under a
//!   birth-death process conditioned on the calibrations.
//! - Proposals: the regraft targets of an SPR move that keep every
//!   calibration satisfiable.
//! - Tree model: [DatedTree] + [LeafLabelMap] using the arena pattern, read
//!   from and written to ultrametric Newick strings.
//!
//! Time is signed: the present is `0` and the past negative, so the root
//! has the most negative time and calibration bounds satisfy
//! `lower <= upper <= 0`.
//!
//! Limitations:
//! - Only binary trees
//! - Leaves are contemporaneous (ultrametric trees)
//!
//! # Example
//! ```
//! use caldate::{DatingConfig, DatingContext};
//!
//! let config = DatingConfig::from_json_str(r#"{
//!     "birth_rate": 1.0,
//!     "death_rate": 0.5,
//!     "calibrations": [
//!         { "clade_id": "AB", "taxa": ["A", "B"], "lower": -2.0, "upper": -0.5 }
//!     ]
//! }"#).unwrap();
//!
//! let mut ctx = DatingContext::from_newick("((A:1,B:1):2,(C:2,D:2):1);", &config).unwrap();
//! ctx.check_consistency().unwrap();
//!
//! let log_prior = ctx.ranked_log_prior().unwrap();
//! assert!(log_prior.is_finite());
//!
//! let a = ctx.leaf("A").unwrap();
//! let prune = ctx.tree().parent(a).unwrap();
//! let targets = ctx.enumerate_regraft_targets(prune, a).unwrap();
//! assert!(!targets.contains(&prune));
//! ```
//!
//! # Logging
//! The crate emits [`tracing`](https://docs.rs/tracing) events and never
//! installs a subscriber; applications choose their own.

pub mod config;
pub mod dating;
pub mod model;
pub mod newick;
pub mod parser;

pub use crate::config::{ConfigError, DatingConfig};
pub use crate::dating::{DatingContext, DatingError, ErrorKind};
pub use crate::model::{DatedTree, LeafLabelMap, VertexIndex};
pub use crate::parser::ParsingError;

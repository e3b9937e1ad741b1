//! Similarity primitives and match aggregation.
//!
//! [`similarity`] scores two node sets against each other, [`feature`] aggregates
//! individual feature matches into size-weighted tree matchings, and [`assignment`]
//! pairs subtrees of two sides by solving the linear assignment problem.

pub mod assignment;
pub mod feature;
pub mod similarity;

//! # Core Module
//!
//! Stateless building blocks of the fragment-space search.
//!
//! - **Molecular Representation** ([`models`]) - Pharmacophore nodes and trees, synthons,
//!   reactions and libraries
//! - **Similarity and Matching** ([`matching`]) - Node-set similarity, feature/tree match
//!   aggregation and the bipartite assignment solver
//! - **Reaction Seam** ([`reaction`]) - The interface through which matched synthons are
//!   turned into products
//! - **File I/O** ([`io`]) - Loading query trees and synthon libraries, writing hit tables

pub mod io;
pub mod matching;
pub mod models;
pub mod reaction;

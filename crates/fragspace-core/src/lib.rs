//! # fragspace Core Library
//!
//! Scaffold hopping and hit expansion over combinatorial synthon spaces. A query molecule,
//! represented as a pharmacophore tree, is matched fragment by fragment against a
//! reaction-defined library of synthons; only combinations whose reacted product is
//! predicted to resemble the query are ever assembled.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless models (`PharmacophoreTree`, `Synthon`,
//!   `SynthonLibrary`), node-set similarity, match aggregation, the assignment solver,
//!   the reaction-engine seam and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful search machinery: the linker index,
//!   the edge-link cache of ranked match lists, the recursive subtree matcher and the
//!   combinatorial assembler that turns cached partial solutions into scored products.
//!
//! - **[`workflows`]: The Public API.** `FragmentSearch` for a single reaction and a
//!   space-wide search that runs every reaction of a library and merges the hits.

pub mod core;
pub mod engine;
pub mod workflows;

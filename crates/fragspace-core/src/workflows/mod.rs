//! # Workflows Module
//!
//! The public entry points of the library.
//!
//! - **Single Reaction** ([`search`]) - [`search::FragmentSearch`] indexes the synthons of one
//!   reaction and returns the products predicted to resemble a query tree.
//! - **Whole Space** ([`space`]) - Runs one search per reaction of a synthon library,
//!   concurrently with the `parallel` feature, and merges the hits.

pub mod search;
pub mod space;

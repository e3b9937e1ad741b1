//! # Engine Module
//!
//! The stateful machinery behind a fragment-space search over one reaction.
//!
//! ## Overview
//!
//! A search proceeds in two stages. The [`matcher`] fills the edge-link cache: for
//! every query edge, cut direction and (linker, position) pair of the reaction it
//! ranks the synthons whose body resembles the query subtree on that side of the
//! cut. Fragments that expose further linkers carry, per linker, the ranked options
//! of the next synthon down the chain. The [`assembler`] then pairs complementary
//! cells, expands their recursive match trees into full synthon tuples, scores them
//! and hands the survivors to the reaction engine.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Matcher and assembler tunables with validation
//! - **Linker Index** ([`linker_index`]) - Which synthons attach through which linker
//! - **Results** ([`result`]) - Ranked match lists and the recursive match tree
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error types

pub(crate) mod assembler;
pub(crate) mod cache;
pub mod config;
pub(crate) mod context;
pub mod error;
pub mod linker_index;
pub(crate) mod matcher;
pub mod progress;
pub mod result;

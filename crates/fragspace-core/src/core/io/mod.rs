//! Reading query trees and synthon libraries, writing hit tables.
//!
//! Query trees and libraries are TOML documents; trees share one node/edge layout
//! handled by [`format`]. Hit tables are written as CSV.

pub mod format;
pub mod hits;
pub mod library;
pub mod query;

use crate::core::models::synthon::Synthon;

/// The product of reacting one synthon per position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Canonical encoding of the product structure.
    pub id_code: String,
}

/// Builds product structures from matched synthons.
///
/// Synthons are passed in position order. Returning `None` means the product could
/// not be formed; the combination is then dropped from the hit list.
pub trait ReactionEngine: Sync {
    fn react(&self, reaction_id: &str, synthons: &[&Synthon]) -> Option<Product>;
}

/// Encodes a product as the position-ordered synthon structures joined with `.`.
///
/// Useful where only the identity of a combination matters; real chemistry plugs
/// in through [`ReactionEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinedSynthonEngine;

impl ReactionEngine for JoinedSynthonEngine {
    fn react(&self, _reaction_id: &str, synthons: &[&Synthon]) -> Option<Product> {
        if synthons.is_empty() {
            return None;
        }
        let id_code = synthons
            .iter()
            .map(|s| s.structure.as_str())
            .collect::<Vec<_>>()
            .join(".");
        Some(Product { id_code })
    }
}

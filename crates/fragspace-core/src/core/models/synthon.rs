use super::ids::{Position, SynthonId};
use super::tree::PharmacophoreTree;
use slotmap::SlotMap;
use thiserror::Error;

/// A reactive building block filling one reactant slot of a reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthon {
    pub id: String,
    pub position: Position,
    /// Encoded fragment structure, including its open attachment points.
    pub structure: String,
    pub tree: PharmacophoreTree,
}

impl Synthon {
    pub fn new(id: &str, position: Position, structure: &str, tree: PharmacophoreTree) -> Self {
        Self {
            id: id.to_string(),
            position,
            structure: structure.to_string(),
            tree,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthonError {
    #[error(
        "Synthon '{synthon}' targets position {position}, but reaction '{reaction}' only has {positions} position(s)"
    )]
    PositionOutOfRange {
        synthon: String,
        reaction: String,
        position: Position,
        positions: usize,
    },
    #[error("Synthon '{synthon}' exposes no link node and cannot take part in reaction '{reaction}'")]
    NoLinkNode { synthon: String, reaction: String },
}

/// The synthons of one reaction, grouped by the position they fill.
#[derive(Debug, Clone, Default)]
pub struct SynthonReaction {
    pub id: String,
    synthons: SlotMap<SynthonId, Synthon>,
    positions: Vec<Vec<SynthonId>>,
}

impl SynthonReaction {
    pub fn new(id: &str, position_count: usize) -> Self {
        Self {
            id: id.to_string(),
            synthons: SlotMap::with_key(),
            positions: vec![Vec::new(); position_count],
        }
    }

    pub fn add_synthon(&mut self, synthon: Synthon) -> Result<SynthonId, SynthonError> {
        if synthon.position >= self.positions.len() {
            return Err(SynthonError::PositionOutOfRange {
                synthon: synthon.id,
                reaction: self.id.clone(),
                position: synthon.position,
                positions: self.positions.len(),
            });
        }
        if synthon.tree.link_nodes().next().is_none() {
            return Err(SynthonError::NoLinkNode {
                synthon: synthon.id,
                reaction: self.id.clone(),
            });
        }
        let position = synthon.position;
        let id = self.synthons.insert(synthon);
        self.positions[position].push(id);
        Ok(id)
    }

    pub fn synthon(&self, id: SynthonId) -> Option<&Synthon> {
        self.synthons.get(id)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn synthons_at(&self, position: Position) -> &[SynthonId] {
        self.positions
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn synthons_iter(&self) -> impl Iterator<Item = (SynthonId, &Synthon)> {
        self.synthons.iter()
    }

    pub fn synthon_count(&self) -> usize {
        self.synthons.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SynthonLibrary {
    reactions: Vec<SynthonReaction>,
}

impl SynthonLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reaction(&mut self, reaction: SynthonReaction) {
        self.reactions.push(reaction);
    }

    pub fn reactions(&self) -> &[SynthonReaction] {
        &self.reactions
    }

    pub fn reaction(&self, id: &str) -> Option<&SynthonReaction> {
        self.reactions.iter().find(|r| r.id == id)
    }

    pub fn synthon_count(&self) -> usize {
        self.reactions.iter().map(SynthonReaction::synthon_count).sum()
    }
}

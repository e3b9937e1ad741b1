use super::ids::LinkerId;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const FUNCTIONALITY_DIMENSIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Functionality {
    Acceptor,
    Donor,
    NegativeCharge,
    PositiveCharge,
    Aromatic,
    Lipophilic,
}

#[rustfmt::skip]
static FUNCTIONALITY_NAMES: Map<&'static str, Functionality> = phf_map! {
    "acceptor" => Functionality::Acceptor, "acc" => Functionality::Acceptor,
    "donor" => Functionality::Donor, "don" => Functionality::Donor,
    "negative-charge" => Functionality::NegativeCharge, "neg" => Functionality::NegativeCharge,
    "positive-charge" => Functionality::PositiveCharge, "pos" => Functionality::PositiveCharge,
    "aromatic" => Functionality::Aromatic, "aro" => Functionality::Aromatic,
    "lipophilic" => Functionality::Lipophilic, "lipo" => Functionality::Lipophilic,
};

impl Functionality {
    pub const ALL: [Functionality; FUNCTIONALITY_DIMENSIONS] = [
        Functionality::Acceptor,
        Functionality::Donor,
        Functionality::NegativeCharge,
        Functionality::PositiveCharge,
        Functionality::Aromatic,
        Functionality::Lipophilic,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Functionality::Acceptor => "acceptor",
            Functionality::Donor => "donor",
            Functionality::NegativeCharge => "negative-charge",
            Functionality::PositiveCharge => "positive-charge",
            Functionality::Aromatic => "aromatic",
            Functionality::Lipophilic => "lipophilic",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown pharmacophore functionality: '{0}'")]
pub struct ParseFunctionalityError(pub String);

impl FromStr for Functionality {
    type Err = ParseFunctionalityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FUNCTIONALITY_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParseFunctionalityError(s.to_string()))
    }
}

impl fmt::Display for Functionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pharmacophoric feature group of a molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNode {
    /// Weight of each functionality, indexed by [`Functionality::index`].
    pub functionalities: [f64; FUNCTIONALITY_DIMENSIONS],
    /// Geometric size of the group, typically its heavy-atom count.
    pub size: f64,
    /// Indices of the atoms this node was built from.
    pub atoms: Vec<usize>,
}

impl FeatureNode {
    pub fn new(functionalities: [f64; FUNCTIONALITY_DIMENSIONS], size: f64) -> Self {
        Self {
            functionalities,
            size,
            atoms: Vec::new(),
        }
    }

    pub fn with_atoms(mut self, atoms: Vec<usize>) -> Self {
        self.atoms = atoms;
        self
    }

    pub fn functionality(&self, kind: Functionality) -> f64 {
        self.functionalities[kind.index()]
    }
}

/// A node of a pharmacophore tree.
///
/// `Link` nodes are placeholders for a bond that has not been formed yet: they mark
/// where another synthon attaches and carry the id of the linker that joins them.
#[derive(Debug, Clone, PartialEq)]
pub enum PharmacophoreNode {
    Feature(FeatureNode),
    Link { linker_id: LinkerId },
}

impl PharmacophoreNode {
    #[inline]
    pub fn is_link_node(&self) -> bool {
        matches!(self, PharmacophoreNode::Link { .. })
    }

    pub fn linker_id(&self) -> Option<LinkerId> {
        match self {
            PharmacophoreNode::Link { linker_id } => Some(*linker_id),
            PharmacophoreNode::Feature(_) => None,
        }
    }

    pub fn feature(&self) -> Option<&FeatureNode> {
        match self {
            PharmacophoreNode::Feature(node) => Some(node),
            PharmacophoreNode::Link { .. } => None,
        }
    }

    /// Link placeholders have no extent.
    pub fn size(&self) -> f64 {
        match self {
            PharmacophoreNode::Feature(node) => node.size,
            PharmacophoreNode::Link { .. } => 0.0,
        }
    }
}

impl From<FeatureNode> for PharmacophoreNode {
    fn from(node: FeatureNode) -> Self {
        PharmacophoreNode::Feature(node)
    }
}

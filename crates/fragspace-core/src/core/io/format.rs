use crate::core::models::ids::LinkerId;
use crate::core::models::node::{
    FUNCTIONALITY_DIMENSIONS, FeatureNode, Functionality, ParseFunctionalityError,
    PharmacophoreNode,
};
use crate::core::models::tree::{PharmacophoreTree, TreeError};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error(transparent)]
    UnknownFunctionality(#[from] ParseFunctionalityError),
    #[error("Feature node {node} has a non-positive size ({size})")]
    InvalidNodeSize { node: usize, size: f64 },
    #[error("Invalid tree: {0}")]
    InvalidTree(#[from] TreeError),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum RawNode {
    Feature {
        size: f64,
        #[serde(default)]
        atoms: Vec<usize>,
        #[serde(default)]
        functionalities: BTreeMap<String, f64>,
    },
    Link {
        #[serde(rename = "linker-id")]
        linker_id: LinkerId,
    },
}

/// The on-disk layout of a pharmacophore tree.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawTree {
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

impl RawTree {
    pub fn into_tree(self) -> Result<PharmacophoreTree, FormatError> {
        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, raw)| convert_node(index, raw))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = self.edges.into_iter().map(|[a, b]| (a, b)).collect();
        Ok(PharmacophoreTree::new(nodes, edges)?)
    }
}

fn convert_node(index: usize, raw: RawNode) -> Result<PharmacophoreNode, FormatError> {
    match raw {
        RawNode::Link { linker_id } => Ok(PharmacophoreNode::Link { linker_id }),
        RawNode::Feature {
            size,
            atoms,
            functionalities,
        } => {
            if !(size > 0.0) {
                return Err(FormatError::InvalidNodeSize { node: index, size });
            }
            let mut weights = [0.0; FUNCTIONALITY_DIMENSIONS];
            for (name, weight) in functionalities {
                let kind: Functionality = name.parse()?;
                weights[kind.index()] += weight;
            }
            Ok(FeatureNode::new(weights, size).with_atoms(atoms).into())
        }
    }
}

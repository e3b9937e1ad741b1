use super::format::{RawNode, RawTree};
use crate::core::models::synthon::{Synthon, SynthonLibrary, SynthonReaction};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LibraryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawLibrary {
    #[serde(default)]
    reactions: Vec<RawReaction>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawReaction {
    id: String,
    positions: usize,
    #[serde(default)]
    synthons: Vec<RawSynthon>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawSynthon {
    id: String,
    position: usize,
    #[serde(default)]
    structure: String,
    #[serde(default)]
    edges: Vec<[usize; 2]>,
    #[serde(default)]
    nodes: Vec<RawNode>,
}

/// Reads a synthon library from a TOML file.
///
/// Malformed synthons (broken trees, positions outside the reaction, no link node)
/// are logged and left out; only unreadable or unparsable files are errors.
pub fn load_library(path: &Path) -> Result<SynthonLibrary, LibraryLoadError> {
    let origin = path.to_string_lossy().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| LibraryLoadError::Io {
        path: origin.clone(),
        source: e,
    })?;
    parse_library(&content, &origin)
}

pub fn parse_library(content: &str, origin: &str) -> Result<SynthonLibrary, LibraryLoadError> {
    let raw: RawLibrary = toml::from_str(content).map_err(|e| LibraryLoadError::Toml {
        path: origin.to_string(),
        source: e,
    })?;

    let mut library = SynthonLibrary::new();
    let mut seen_reactions = HashSet::new();
    let mut excluded = 0usize;

    for raw_reaction in raw.reactions {
        if raw_reaction.positions == 0 {
            warn!(reaction = %raw_reaction.id, "Skipping reaction without reactant positions.");
            continue;
        }
        if !seen_reactions.insert(raw_reaction.id.clone()) {
            warn!(reaction = %raw_reaction.id, "Skipping duplicate reaction definition.");
            continue;
        }

        let mut reaction = SynthonReaction::new(&raw_reaction.id, raw_reaction.positions);
        for raw_synthon in raw_reaction.synthons {
            let tree = match (RawTree {
                edges: raw_synthon.edges,
                nodes: raw_synthon.nodes,
            })
            .into_tree()
            {
                Ok(tree) => tree,
                Err(e) => {
                    warn!(
                        reaction = %raw_reaction.id,
                        synthon = %raw_synthon.id,
                        "Excluding synthon with unusable pharmacophore tree: {}",
                        e
                    );
                    excluded += 1;
                    continue;
                }
            };
            let synthon = Synthon::new(
                &raw_synthon.id,
                raw_synthon.position,
                &raw_synthon.structure,
                tree,
            );
            if let Err(e) = reaction.add_synthon(synthon) {
                warn!("Excluding synthon: {}", e);
                excluded += 1;
            }
        }
        library.add_reaction(reaction);
    }

    info!(
        reactions = library.reactions().len(),
        synthons = library.synthon_count(),
        excluded,
        "Synthon library loaded from '{}'.",
        origin
    );
    Ok(library)
}

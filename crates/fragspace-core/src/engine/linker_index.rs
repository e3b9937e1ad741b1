use crate::core::models::ids::{LinkerId, Position, SynthonId};
use crate::core::models::synthon::SynthonReaction;
use crate::core::models::tree::{Cut, PharmacophoreTree};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Where a linker attaches to one synthon's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSite {
    pub synthon: SynthonId,
    pub link_node: usize,
    /// The single edge joining the link node to the fragment body.
    pub edge: usize,
}

impl LinkSite {
    /// The cut rooting the fragment body, i.e. everything but the link node itself.
    pub fn body_cut(&self, tree: &PharmacophoreTree) -> Cut {
        let (a, b) = tree.edge(self.edge);
        let body_head = if a == self.link_node { b } else { a };
        tree.cut_toward(self.edge, body_head)
    }
}

/// Maps each (linker id, position) to the synthons exposing that linker.
#[derive(Debug, Clone, Default)]
pub struct LinkerIndex {
    sites: BTreeMap<(LinkerId, Position), Vec<LinkSite>>,
}

impl LinkerIndex {
    pub fn build(reaction: &SynthonReaction) -> Self {
        let mut sites: BTreeMap<(LinkerId, Position), Vec<LinkSite>> = BTreeMap::new();

        for position in 0..reaction.position_count() {
            for &synthon_id in reaction.synthons_at(position) {
                let Some(synthon) = reaction.synthon(synthon_id) else {
                    continue;
                };
                let mut seen_linkers = Vec::new();
                for (link_node, linker_id) in synthon.tree.link_nodes() {
                    if seen_linkers.contains(&linker_id) {
                        warn!(
                            synthon = %synthon.id,
                            linker_id,
                            "Synthon exposes the same linker twice; only the first site is indexed."
                        );
                        continue;
                    }
                    let neighbors = synthon.tree.neighbors(link_node);
                    if neighbors.len() != 1 {
                        warn!(
                            synthon = %synthon.id,
                            linker_id,
                            degree = neighbors.len(),
                            "Link node is not a leaf; site excluded from the linker index."
                        );
                        continue;
                    }
                    seen_linkers.push(linker_id);
                    sites.entry((linker_id, position)).or_default().push(LinkSite {
                        synthon: synthon_id,
                        link_node,
                        edge: neighbors[0].1,
                    });
                }
            }
        }

        debug!(
            reaction = %reaction.id,
            cells = sites.len(),
            "Linker index built."
        );
        Self { sites }
    }

    pub fn sites(&self, linker_id: LinkerId, position: Position) -> &[LinkSite] {
        self.sites
            .get(&(linker_id, position))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All (linker id, position) pairs with at least one synthon, in ascending order.
    pub fn cells(&self) -> impl Iterator<Item = (LinkerId, Position)> + '_ {
        self.sites.keys().copied()
    }

    /// Positions other than `position` whose synthons expose `linker_id`.
    pub fn partner_positions(&self, linker_id: LinkerId, position: Position) -> Vec<Position> {
        self.sites
            .range((linker_id, 0)..=(linker_id, Position::MAX))
            .map(|(&(_, p), _)| p)
            .filter(|&p| p != position)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

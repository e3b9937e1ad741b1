use super::cache::{CellKey, EdgeLinkCache};
use super::context::SearchContext;
use super::result::{FragmentMatching, MatchTree, SearchResult};
use crate::core::matching::assignment::maximize_similarity;
use crate::core::matching::feature::{FeatureMatch, TreeMatching};
use crate::core::matching::similarity::node_set_similarity;
use crate::core::models::ids::{LinkerId, Position};
use crate::core::models::synthon::Synthon;
use crate::core::models::tree::{Cut, ExtensionCut, PharmacophoreTree, RootedSubtree};
use nalgebra::DMatrix;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// Best match found for one (query cut, fragment cut) pair.
#[derive(Debug, Clone)]
struct SubtreeMatch {
    tree: MatchTree,
    similarity: f64,
    /// Every link node of the fragment subtree leads to a non-empty option list.
    resolved: bool,
}

impl SubtreeMatch {
    fn rank(&self) -> (bool, f64) {
        (self.resolved, self.similarity)
    }

    fn outranks(&self, other: &SubtreeMatch) -> bool {
        self.rank() > other.rank()
    }
}

/// Per-synthon memo of subtree matches, keyed by (query cut, fragment cut).
type MatchMemo = HashMap<(Cut, Cut), SubtreeMatch>;

/// The synthon being matched for one cell.
struct Candidate<'s> {
    synthon: &'s Synthon,
    position: Position,
    /// Linkers whose only partners lie across the cell's own bond cut. They close a ring
    /// onto the partner synthon and need no further match.
    closing: Vec<LinkerId>,
}

impl Candidate<'_> {
    fn closes(&self, linker_id: LinkerId) -> bool {
        self.closing.contains(&linker_id)
    }

    fn has_open_link(&self, nodes: &[usize]) -> bool {
        nodes.iter().any(|&n| {
            self.synthon
                .tree
                .node(n)
                .linker_id()
                .is_some_and(|id| !self.closes(id))
        })
    }
}

/// Fills edge-link cache cells by recursively matching query subtrees against synthon trees.
pub struct SubtreeMatcher<'a> {
    context: SearchContext<'a>,
    cache: EdgeLinkCache,
    cell_limit_reached: bool,
}

impl<'a> SubtreeMatcher<'a> {
    pub fn new(context: SearchContext<'a>) -> Self {
        Self {
            context,
            cache: EdgeLinkCache::new(),
            cell_limit_reached: false,
        }
    }

    pub fn cache(&self) -> &EdgeLinkCache {
        &self.cache
    }

    /// `true` once `max_cells` stopped the computation of further cells.
    pub fn cell_limit_reached(&self) -> bool {
        self.cell_limit_reached
    }

    /// Returns the cached cell, computing it first when needed.
    pub fn cell(&mut self, key: CellKey) -> Arc<SearchResult> {
        if let Some(result) = self.cache.get(&key) {
            return result;
        }
        let capacity = self.context.config.n_best_solutions;
        if !self.cache.begin(key) {
            warn!(
                linker_id = key.linker_id,
                position = key.position,
                "Cyclic linker chain detected; cell left empty."
            );
            return Arc::new(SearchResult::new(capacity));
        }
        if let Some(max_cells) = self.context.config.max_cells {
            if self.cache.len() >= max_cells {
                if !self.cell_limit_reached {
                    warn!(max_cells, "Cell limit reached; remaining cells are left empty.");
                    self.cell_limit_reached = true;
                }
                return self.cache.insert(key, SearchResult::new(capacity));
            }
        }
        let result = self.compute_cell(key);
        self.cache.insert(key, result)
    }

    #[instrument(skip(self), level = "debug", fields(linker_id = key.linker_id, position = key.position))]
    fn compute_cell(&mut self, key: CellKey) -> SearchResult {
        let context = self.context;
        let nms = context.null_match_scaling();
        let threshold = context.pruning_threshold();
        let mut result = SearchResult::new(context.config.n_best_solutions);
        let mut examined = 0usize;
        let partners = context.index.partner_positions(key.linker_id, key.position);

        for site in context.index.sites(key.linker_id, key.position) {
            let Some(synthon) = context.reaction.synthon(site.synthon) else {
                continue;
            };
            examined += 1;
            let fragment_cut = site.body_cut(&synthon.tree);
            let candidate = Candidate {
                synthon,
                position: key.position,
                closing: self.closing_linkers(synthon, key.position, &partners),
            };
            let mut memo = MatchMemo::new();
            let found = self.match_cached(&mut memo, &candidate, key.cut, fragment_cut);
            if !found.resolved {
                trace!(synthon = %synthon.id, "Dropped: a further linker has no candidates.");
                continue;
            }
            let mut matching =
                FragmentMatching::new(site.synthon, key.position, key.linker_id, found.tree);
            let similarity = matching.calculate(nms);
            if similarity > threshold {
                result.add_result(matching, nms);
            } else {
                trace!(synthon = %synthon.id, similarity, "Dropped below pruning threshold.");
            }
        }

        debug!(
            examined,
            kept = result.len(),
            best = result.best_similarity(),
            "Cell computed."
        );
        result
    }

    /// Linkers of `synthon` whose partner positions all belong to `partners`.
    fn closing_linkers(
        &self,
        synthon: &Synthon,
        position: Position,
        partners: &[Position],
    ) -> Vec<LinkerId> {
        let mut closing: Vec<LinkerId> = synthon
            .tree
            .link_nodes()
            .map(|(_, linker_id)| linker_id)
            .filter(|&linker_id| {
                let across = self.context.index.partner_positions(linker_id, position);
                !across.is_empty() && across.iter().all(|p| partners.contains(p))
            })
            .collect();
        closing.sort_unstable();
        closing.dedup();
        closing
    }

    fn match_cached(
        &mut self,
        memo: &mut MatchMemo,
        candidate: &Candidate,
        query_cut: Cut,
        fragment_cut: Cut,
    ) -> SubtreeMatch {
        if let Some(found) = memo.get(&(query_cut, fragment_cut)) {
            return found.clone();
        }
        let found = self.match_subtrees(memo, candidate, query_cut, fragment_cut);
        memo.insert((query_cut, fragment_cut), found.clone());
        found
    }

    fn match_subtrees(
        &mut self,
        memo: &mut MatchMemo,
        candidate: &Candidate,
        query_cut: Cut,
        fragment_cut: Cut,
    ) -> SubtreeMatch {
        let context = self.context;
        let config = context.config;
        let query = context.query;
        let fragment = &candidate.synthon.tree;
        let q = query.subtree(query_cut);
        let f = fragment.subtree(fragment_cut);

        if let [single] = f.nodes.as_slice() {
            if let Some(linker_id) = fragment.node(*single).linker_id() {
                if candidate.closes(linker_id) {
                    let matching = [FeatureMatch::unmatched_query(query, &q.nodes)];
                    return self.finish(MatchTree::Leaf(matching.into_iter().collect()), true);
                }
                return self.further_match(linker_id, candidate.position, query_cut);
            }
        }

        let fragment_has_links = candidate.has_open_link(&f.nodes);
        let is_small = |tree: &PharmacophoreTree, subtree: &RootedSubtree| {
            tree.total_size(&subtree.nodes) < config.match_size_limit
                || subtree.node_count() < config.match_node_nr_limit
        };
        if !fragment_has_links && (is_small(query, &q) || is_small(fragment, &f)) {
            return self.direct_match(fragment, &q, &f, true);
        }

        let query_cuts = query.extension_cuts(&q);
        let fragment_cuts = fragment.extension_cuts(&f);
        if query_cuts.is_empty() && fragment_cuts.is_empty() {
            return self.direct_match(fragment, &q, &f, !fragment_has_links);
        }
        let query_cuts = or_trivial(query_cuts, &q);
        let fragment_cuts = or_trivial(fragment_cuts, &f);

        let pairs = self.rank_cut_pairs(fragment, &query_cuts, &fragment_cuts);
        let mut best: Option<SubtreeMatch> = None;
        for (qc, fc) in pairs {
            let found = self.match_extension(memo, candidate, qc, fc);
            if best.as_ref().is_none_or(|b| found.outranks(b)) {
                best = Some(found);
            }
        }
        best.unwrap_or_else(|| self.finish(MatchTree::default(), false))
    }

    fn further_match(
        &mut self,
        linker_id: LinkerId,
        position: Position,
        query_cut: Cut,
    ) -> SubtreeMatch {
        let context = self.context;
        let nms = context.null_match_scaling();
        let partners = context.index.partner_positions(linker_id, position);
        let options = match partners.as_slice() {
            [partner] => self.cell(CellKey::new(linker_id, *partner, query_cut)),
            _ => {
                let mut merged = SearchResult::new(context.config.n_best_solutions);
                for partner in partners {
                    let cell = self.cell(CellKey::new(linker_id, partner, query_cut));
                    merged.merge(&cell, nms);
                }
                Arc::new(merged)
            }
        };
        let resolved = !options.is_empty();
        self.finish(MatchTree::further(linker_id, options), resolved)
    }

    /// One match over both node sets when their sizes are balanced, otherwise a null
    /// match for each side.
    fn direct_match(
        &self,
        fragment: &PharmacophoreTree,
        q: &RootedSubtree,
        f: &RootedSubtree,
        resolved: bool,
    ) -> SubtreeMatch {
        let query = self.context.query;
        let q_size = query.total_size(&q.nodes);
        let f_size = fragment.total_size(&f.nodes);
        let (lo, hi) = (q_size.min(f_size), q_size.max(f_size));
        let balanced = lo > 0.0 && hi / lo <= self.context.config.match_balance;

        let matching: TreeMatching = if balanced {
            [FeatureMatch::between(query, &q.nodes, fragment, &f.nodes)]
                .into_iter()
                .collect()
        } else {
            [
                FeatureMatch::unmatched_query(query, &q.nodes),
                FeatureMatch::unmatched_fragment(fragment, &f.nodes),
            ]
            .into_iter()
            .collect()
        };
        self.finish(MatchTree::Leaf(matching), resolved)
    }

    /// Cut pairs ordered by their estimated score, truncated to `extension_matches`.
    fn rank_cut_pairs<'c>(
        &self,
        fragment: &PharmacophoreTree,
        query_cuts: &'c [ExtensionCut],
        fragment_cuts: &'c [ExtensionCut],
    ) -> Vec<(&'c ExtensionCut, &'c ExtensionCut)> {
        let query = self.context.query;
        let alpha = self.context.config.alpha;

        let mut scored: Vec<(f64, &ExtensionCut, &ExtensionCut)> = Vec::new();
        for qc in query_cuts {
            let q_sources = source_nodes(query, &qc.sources);
            for fc in fragment_cuts {
                let extension_score =
                    node_set_similarity(query, &qc.extension, fragment, &fc.extension);
                let source_score = match (qc.sources.is_empty(), fc.sources.is_empty()) {
                    (true, true) => 1.0,
                    (true, false) | (false, true) => 0.0,
                    (false, false) => node_set_similarity(
                        query,
                        &q_sources,
                        fragment,
                        &source_nodes(fragment, &fc.sources),
                    ),
                };
                scored.push((alpha * extension_score + (1.0 - alpha) * source_score, qc, fc));
            }
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(self.context.config.extension_matches)
            .map(|(_, qc, fc)| (qc, fc))
            .collect()
    }

    fn match_extension(
        &mut self,
        memo: &mut MatchMemo,
        candidate: &Candidate,
        qc: &ExtensionCut,
        fc: &ExtensionCut,
    ) -> SubtreeMatch {
        let query = self.context.query;
        let fragment = &candidate.synthon.tree;
        let mut tree = MatchTree::Leaf(
            [FeatureMatch::between(query, &qc.extension, fragment, &fc.extension)]
                .into_iter()
                .collect(),
        );
        let mut resolved = !candidate.has_open_link(&fc.extension);

        let mut query_assigned = vec![false; qc.sources.len()];
        let mut fragment_assigned = vec![false; fc.sources.len()];

        if !qc.sources.is_empty() && !fc.sources.is_empty() {
            let mut candidates = Vec::with_capacity(qc.sources.len() * fc.sources.len());
            for &q_source in &qc.sources {
                for &f_source in &fc.sources {
                    candidates.push(self.match_cached(memo, candidate, q_source, f_source));
                }
            }
            let columns = fc.sources.len();
            let similarity = DMatrix::from_fn(qc.sources.len(), columns, |i, j| {
                candidates[i * columns + j].similarity
            });
            for (i, j) in maximize_similarity(&similarity) {
                let chosen = &candidates[i * columns + j];
                tree.absorb(chosen.tree.clone());
                resolved &= chosen.resolved;
                query_assigned[i] = true;
                fragment_assigned[j] = true;
            }
        }

        for (&cut, _) in qc.sources.iter().zip(&query_assigned).filter(|(_, a)| !**a) {
            tree.push(FeatureMatch::unmatched_query(query, &query.subtree(cut).nodes));
        }
        for (&cut, _) in fc.sources.iter().zip(&fragment_assigned).filter(|(_, a)| !**a) {
            let nodes = fragment.subtree(cut).nodes;
            if candidate.has_open_link(&nodes) {
                resolved = false;
            }
            tree.push(FeatureMatch::unmatched_fragment(fragment, &nodes));
        }

        self.finish(tree, resolved)
    }

    fn finish(&self, tree: MatchTree, resolved: bool) -> SubtreeMatch {
        let similarity = tree.similarity(self.context.null_match_scaling());
        SubtreeMatch {
            tree,
            similarity,
            resolved,
        }
    }
}

fn or_trivial(cuts: Vec<ExtensionCut>, subtree: &RootedSubtree) -> Vec<ExtensionCut> {
    if cuts.is_empty() {
        vec![ExtensionCut {
            extension: subtree.nodes.clone(),
            sources: Vec::new(),
        }]
    } else {
        cuts
    }
}

fn source_nodes(tree: &PharmacophoreTree, sources: &[Cut]) -> Vec<usize> {
    sources
        .iter()
        .flat_map(|&cut| tree.subtree(cut).nodes)
        .collect()
}

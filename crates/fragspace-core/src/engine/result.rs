use crate::core::matching::feature::{FeatureMatch, TreeMatching, aggregate_similarity};
use crate::core::models::ids::{LinkerId, Position, SynthonId};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ranked options for the synthon attaching at each further linker.
pub type FurtherMatches = BTreeMap<LinkerId, Arc<SearchResult>>;

/// How a fragment subtree relates to a query subtree.
///
/// A `Branch` records, for every link node the fragment exposes beyond its own
/// attachment point, the ranked candidates of the next synthon down the chain.
/// Depth is bounded by the number of reaction positions.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchTree {
    Leaf(TreeMatching),
    Branch {
        matching: TreeMatching,
        further: FurtherMatches,
    },
}

impl Default for MatchTree {
    fn default() -> Self {
        MatchTree::Leaf(TreeMatching::new())
    }
}

impl MatchTree {
    /// A lone link node, resolved entirely by the synthons attaching there.
    pub fn further(linker_id: LinkerId, options: Arc<SearchResult>) -> Self {
        MatchTree::Branch {
            matching: TreeMatching::new(),
            further: BTreeMap::from([(linker_id, options)]),
        }
    }

    pub fn matching(&self) -> &TreeMatching {
        match self {
            MatchTree::Leaf(matching) | MatchTree::Branch { matching, .. } => matching,
        }
    }

    pub fn further_matches(&self) -> Option<&FurtherMatches> {
        match self {
            MatchTree::Leaf(_) => None,
            MatchTree::Branch { further, .. } => Some(further),
        }
    }

    pub fn push(&mut self, feature_match: FeatureMatch) {
        match self {
            MatchTree::Leaf(matching) | MatchTree::Branch { matching, .. } => {
                matching.push(feature_match)
            }
        }
    }

    /// Merges the feature matches and further branches of `other` into `self`.
    pub fn absorb(&mut self, other: MatchTree) {
        let (matches, other_further) = match other {
            MatchTree::Leaf(matching) => (matching, None),
            MatchTree::Branch { matching, further } => (matching, Some(further)),
        };
        match self {
            MatchTree::Leaf(matching) => {
                matching.extend(matches.matches().iter().copied());
                if let Some(further) = other_further {
                    *self = MatchTree::Branch {
                        matching: std::mem::take(matching),
                        further,
                    };
                }
            }
            MatchTree::Branch { matching, further } => {
                matching.extend(matches.matches().iter().copied());
                if let Some(other_further) = other_further {
                    further.extend(other_further);
                }
            }
        }
    }

    /// Own feature matches plus those of the best option of every further branch.
    pub fn best_feature_matches(&self) -> Vec<FeatureMatch> {
        let mut matches = self.matching().matches().to_vec();
        if let Some(further) = self.further_matches() {
            for options in further.values() {
                if let Some(best) = options.best() {
                    matches.extend(best.tree.best_feature_matches());
                }
            }
        }
        matches
    }

    pub fn similarity(&self, null_match_scaling: f64) -> f64 {
        aggregate_similarity(&self.best_feature_matches(), null_match_scaling)
    }

    /// `true` when every further branch has at least one candidate, recursively along the best path.
    pub fn is_complete(&self) -> bool {
        match self.further_matches() {
            None => true,
            Some(further) => further
                .values()
                .all(|options| options.best().is_some_and(|best| best.tree.is_complete())),
        }
    }
}

/// One synthon matched against a query subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMatching {
    pub synthon: SynthonId,
    pub position: Position,
    /// The linker through which this synthon attaches to its parent.
    pub linker_id: LinkerId,
    pub tree: MatchTree,
    similarity: Option<f64>,
}

/// A fully expanded path through a `FragmentMatching`: one synthon per visited position.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSolution {
    pub synthons: Vec<(Position, SynthonId)>,
    pub matches: Vec<FeatureMatch>,
}

impl PartialSolution {
    fn join(&self, other: &PartialSolution) -> PartialSolution {
        let mut synthons = self.synthons.clone();
        synthons.extend(other.synthons.iter().copied());
        let mut matches = self.matches.clone();
        matches.extend(other.matches.iter().copied());
        PartialSolution { synthons, matches }
    }
}

impl FragmentMatching {
    pub fn new(synthon: SynthonId, position: Position, linker_id: LinkerId, tree: MatchTree) -> Self {
        Self {
            synthon,
            position,
            linker_id,
            tree,
            similarity: None,
        }
    }

    pub fn calculate(&mut self, null_match_scaling: f64) -> f64 {
        let similarity = self.tree.similarity(null_match_scaling);
        self.similarity = Some(similarity);
        similarity
    }

    /// `None` until [`FragmentMatching::calculate`] has run.
    pub fn similarity(&self) -> Option<f64> {
        self.similarity
    }

    /// Every combination of one option per further branch, recursively.
    ///
    /// A branch without options yields no solutions, since the position it leads to
    /// would stay empty.
    pub fn construct_solutions(&self) -> Vec<PartialSolution> {
        let mut solutions = vec![PartialSolution {
            synthons: vec![(self.position, self.synthon)],
            matches: self.tree.matching().matches().to_vec(),
        }];
        if let Some(further) = self.tree.further_matches() {
            for options in further.values() {
                let expanded: Vec<PartialSolution> = options
                    .entries()
                    .iter()
                    .flat_map(FragmentMatching::construct_solutions)
                    .collect();
                solutions = solutions
                    .iter()
                    .cartesian_product(expanded.iter())
                    .map(|(base, next)| base.join(next))
                    .collect();
                if solutions.is_empty() {
                    break;
                }
            }
        }
        solutions
    }
}

/// A ranked, size-bounded list of fragment matchings for one cache cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    capacity: usize,
    entries: Vec<FragmentMatching>,
}

impl SearchResult {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity.min(64)),
        }
    }

    /// Inserts in descending similarity order and truncates to capacity.
    ///
    /// Entries tying with existing ones go after them, so insertion order breaks ties.
    pub fn add_result(&mut self, mut matching: FragmentMatching, null_match_scaling: f64) {
        let similarity = match matching.similarity() {
            Some(s) => s,
            None => matching.calculate(null_match_scaling),
        };
        let index = self
            .entries
            .partition_point(|e| e.similarity().unwrap_or(0.0) >= similarity);
        if index >= self.capacity {
            return;
        }
        self.entries.insert(index, matching);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> &[FragmentMatching] {
        &self.entries
    }

    pub fn best(&self) -> Option<&FragmentMatching> {
        self.entries.first()
    }

    pub fn best_similarity(&self) -> f64 {
        self.best().and_then(FragmentMatching::similarity).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges another list into this one, keeping the ranking and capacity.
    pub fn merge(&mut self, other: &SearchResult, null_match_scaling: f64) {
        for entry in other.entries() {
            self.add_result(entry.clone(), null_match_scaling);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    const SCALING: f64 = 0.7;

    fn synthon_id(n: u64) -> SynthonId {
        SynthonId::from(KeyData::from_ffi(n))
    }

    fn leaf(similarity: f64, size: f64) -> MatchTree {
        MatchTree::Leaf([FeatureMatch::new(similarity, size, size)].into_iter().collect())
    }

    fn matching(n: u64, position: Position, similarity: f64) -> FragmentMatching {
        FragmentMatching::new(synthon_id(n), position, 1, leaf(similarity, 2.0))
    }

    #[test]
    fn add_result_keeps_descending_order_and_capacity() {
        let mut result = SearchResult::new(3);
        for (n, sim) in [(1, 0.4), (2, 0.9), (3, 0.6), (4, 0.7), (5, 0.1)] {
            result.add_result(matching(n, 0, sim), SCALING);
        }
        let sims: Vec<f64> = result
            .entries()
            .iter()
            .map(|e| e.similarity().unwrap())
            .collect();
        assert_eq!(result.len(), 3);
        assert!(sims.windows(2).all(|w| w[0] >= w[1]));
        assert!((sims[0] - 0.9).abs() < 1e-12);
        assert!((sims[2] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn add_result_places_ties_after_existing_entries() {
        let mut result = SearchResult::new(5);
        result.add_result(matching(1, 0, 0.5), SCALING);
        result.add_result(matching(2, 0, 0.5), SCALING);
        assert_eq!(result.entries()[0].synthon, synthon_id(1));
        assert_eq!(result.entries()[1].synthon, synthon_id(2));
    }

    #[test]
    fn fragment_similarity_is_undefined_until_calculated() {
        let mut m = matching(1, 0, 0.8);
        assert_eq!(m.similarity(), None);
        let sim = m.calculate(SCALING);
        assert!((sim - 0.8).abs() < 1e-12);
        assert_eq!(m.similarity(), Some(sim));
    }

    #[test]
    fn branch_similarity_includes_best_further_option() {
        let mut options = SearchResult::new(2);
        options.add_result(matching(7, 1, 0.2), SCALING);
        options.add_result(matching(8, 1, 1.0), SCALING);
        let mut tree = leaf(0.6, 2.0);
        tree.absorb(MatchTree::further(2, Arc::new(options)));

        let mut m = FragmentMatching::new(synthon_id(1), 0, 1, tree);
        let sim = m.calculate(SCALING);
        // best option (1.0, size 2) joins own (0.6, size 2): (1.2 + 2.0) / 4
        assert!((sim - 0.8).abs() < 1e-12);
        assert!(m.tree.is_complete());
    }

    #[test]
    fn construct_solutions_expands_every_further_option() {
        let mut options = SearchResult::new(5);
        options.add_result(matching(7, 1, 0.9), SCALING);
        options.add_result(matching(8, 1, 0.5), SCALING);
        let tree = MatchTree::Branch {
            matching: [FeatureMatch::new(0.6, 1.0, 1.0)].into_iter().collect(),
            further: BTreeMap::from([(2, Arc::new(options))]),
        };
        let m = FragmentMatching::new(synthon_id(1), 0, 1, tree);

        let solutions = m.construct_solutions();
        assert_eq!(solutions.len(), 2);
        assert_eq!(
            solutions[0].synthons,
            vec![(0, synthon_id(1)), (1, synthon_id(7))]
        );
        assert_eq!(solutions[1].synthons[1], (1, synthon_id(8)));
        assert_eq!(solutions[0].matches.len(), 2);
    }

    #[test]
    fn empty_further_branch_yields_no_solutions() {
        let tree = MatchTree::further(2, Arc::new(SearchResult::new(3)));
        let m = FragmentMatching::new(synthon_id(1), 0, 1, tree);
        assert!(m.construct_solutions().is_empty());
        assert!(!m.tree.is_complete());
    }

    #[test]
    fn absorb_promotes_leaf_to_branch() {
        let mut tree = leaf(0.5, 1.0);
        assert!(tree.further_matches().is_none());
        tree.absorb(leaf(0.7, 1.0));
        assert_eq!(tree.matching().matches().len(), 2);
        tree.absorb(MatchTree::further(4, Arc::new(SearchResult::new(1))));
        assert_eq!(tree.matching().matches().len(), 2);
        assert!(tree.further_matches().unwrap().contains_key(&4));
    }

    #[test]
    fn merge_keeps_ranking_across_lists() {
        let mut first = SearchResult::new(2);
        first.add_result(matching(1, 0, 0.3), SCALING);
        let mut second = SearchResult::new(2);
        second.add_result(matching(2, 0, 0.9), SCALING);
        second.add_result(matching(3, 0, 0.5), SCALING);
        first.merge(&second, SCALING);
        let ids: Vec<SynthonId> = first.entries().iter().map(|e| e.synthon).collect();
        assert_eq!(ids, vec![synthon_id(2), synthon_id(3)]);
        assert!((first.best_similarity() - 0.9).abs() < 1e-12);
    }
}

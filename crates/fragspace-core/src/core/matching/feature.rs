use super::similarity::node_set_similarity;
use crate::core::models::tree::PharmacophoreTree;

/// Match quality of one node set of the query against one node set of a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureMatch {
    similarity: f64,
    size1: f64,
    size2: f64,
}

impl FeatureMatch {
    pub fn new(similarity: f64, size1: f64, size2: f64) -> Self {
        Self {
            similarity: similarity.clamp(0.0, 1.0),
            size1: size1.max(0.0),
            size2: size2.max(0.0),
        }
    }

    pub fn between(
        tree1: &PharmacophoreTree,
        nodes1: &[usize],
        tree2: &PharmacophoreTree,
        nodes2: &[usize],
    ) -> Self {
        Self::new(
            node_set_similarity(tree1, nodes1, tree2, nodes2),
            tree1.total_size(nodes1),
            tree2.total_size(nodes2),
        )
    }

    /// Query nodes left without a fragment counterpart.
    pub fn unmatched_query(tree: &PharmacophoreTree, nodes: &[usize]) -> Self {
        Self::new(0.0, tree.total_size(nodes), 0.0)
    }

    /// Fragment nodes left without a query counterpart.
    pub fn unmatched_fragment(tree: &PharmacophoreTree, nodes: &[usize]) -> Self {
        Self::new(0.0, 0.0, tree.total_size(nodes))
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    pub fn sizes(&self) -> (f64, f64) {
        (self.size1, self.size2)
    }

    pub fn is_null_match(&self) -> bool {
        self.size1 == 0.0 || self.size2 == 0.0
    }
}

/// Size-weighted average of feature match similarities.
///
/// The normalizer `scaling * max(S1, S2) + (1 - scaling) * min(S1, S2)` grows with the
/// size mismatch of the two sides, so uncovered nodes cost more than their share. With
/// `scaling >= 0.5` the result never exceeds 1.
pub fn aggregate_similarity<'a, I>(matches: I, null_match_scaling: f64) -> f64
where
    I: IntoIterator<Item = &'a FeatureMatch>,
{
    let (weighted, size1, size2) =
        matches
            .into_iter()
            .fold((0.0, 0.0, 0.0), |(weighted, size1, size2), m| {
                (
                    weighted + m.similarity * 0.5 * (m.size1 + m.size2),
                    size1 + m.size1,
                    size2 + m.size2,
                )
            });
    let norm = null_match_scaling * f64::max(size1, size2)
        + (1.0 - null_match_scaling) * f64::min(size1, size2);
    if norm <= 0.0 {
        return 0.0;
    }
    (weighted / norm).clamp(0.0, 1.0)
}

/// A collection of feature matches with a lazily computed aggregate similarity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeMatching {
    matches: Vec<FeatureMatch>,
    similarity: Option<f64>,
}

impl TreeMatching {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature_match: FeatureMatch) {
        self.matches.push(feature_match);
        self.similarity = None;
    }

    pub fn extend<I: IntoIterator<Item = FeatureMatch>>(&mut self, matches: I) {
        self.matches.extend(matches);
        self.similarity = None;
    }

    pub fn matches(&self) -> &[FeatureMatch] {
        &self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn sizes(&self) -> (f64, f64) {
        self.matches.iter().fold((0.0, 0.0), |(a, b), m| {
            let (s1, s2) = m.sizes();
            (a + s1, b + s2)
        })
    }

    pub fn calculate(&mut self, null_match_scaling: f64) -> f64 {
        let similarity = aggregate_similarity(&self.matches, null_match_scaling);
        self.similarity = Some(similarity);
        similarity
    }

    /// `None` until [`TreeMatching::calculate`] has run since the last modification.
    pub fn similarity(&self) -> Option<f64> {
        self.similarity
    }
}

impl FromIterator<FeatureMatch> for TreeMatching {
    fn from_iter<I: IntoIterator<Item = FeatureMatch>>(iter: I) -> Self {
        Self {
            matches: iter.into_iter().collect(),
            similarity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_similarity_and_sizes() {
        let m = FeatureMatch::new(1.7, -2.0, 3.0);
        assert_eq!(m.similarity(), 1.0);
        assert_eq!(m.sizes(), (0.0, 3.0));
        assert!(m.is_null_match());
    }

    #[test]
    fn aggregate_is_weighted_average_for_balanced_sizes() {
        let matches = [FeatureMatch::new(1.0, 2.0, 2.0), FeatureMatch::new(0.5, 6.0, 6.0)];
        let sim = aggregate_similarity(&matches, 0.7);
        assert!((sim - (2.0 + 3.0) / 8.0).abs() < 1e-12);
    }

    #[test]
    fn aggregate_penalizes_size_mismatch_beyond_average() {
        let matches = [FeatureMatch::new(1.0, 4.0, 4.0), FeatureMatch::new(0.0, 4.0, 0.0)];
        let plain = aggregate_similarity(&matches, 0.5);
        let scaled = aggregate_similarity(&matches, 0.9);
        assert!((plain - 4.0 / 6.0).abs() < 1e-12);
        assert!((scaled - 4.0 / (0.9 * 8.0 + 0.1 * 4.0)).abs() < 1e-12);
        assert!(scaled < plain);
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        assert_eq!(aggregate_similarity(&[], 0.7), 0.0);
        assert_eq!(aggregate_similarity(&[FeatureMatch::new(1.0, 0.0, 0.0)], 0.7), 0.0);
    }

    #[test]
    fn aggregate_never_exceeds_one() {
        let matches = [
            FeatureMatch::new(1.0, 1.0, 9.0),
            FeatureMatch::new(1.0, 9.0, 1.0),
        ];
        for scaling in [0.5, 0.6, 0.8, 1.0] {
            let sim = aggregate_similarity(&matches, scaling);
            assert!((0.0..=1.0).contains(&sim));
        }
    }

    #[test]
    fn tree_matching_similarity_is_undefined_until_calculated() {
        let mut matching = TreeMatching::new();
        matching.push(FeatureMatch::new(0.8, 3.0, 3.0));
        assert_eq!(matching.similarity(), None);
        let sim = matching.calculate(0.7);
        assert_eq!(matching.similarity(), Some(sim));
        matching.push(FeatureMatch::new(0.0, 1.0, 0.0));
        assert_eq!(matching.similarity(), None);
        assert_eq!(matching.sizes(), (4.0, 3.0));
    }
}

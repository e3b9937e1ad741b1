use crate::core::models::node::{FUNCTIONALITY_DIMENSIONS, PharmacophoreNode};
use crate::core::models::tree::PharmacophoreTree;

/// Score given to a set made only of link placeholders: what will attach there is unknown.
pub const LINK_PLACEHOLDER_SIMILARITY: f64 = 0.5;

/// Summed feature content of a set of tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureProfile {
    pub functionalities: [f64; FUNCTIONALITY_DIMENSIONS],
    pub size: f64,
    pub feature_count: usize,
    pub link_count: usize,
}

impl FeatureProfile {
    pub fn from_nodes(tree: &PharmacophoreTree, nodes: &[usize]) -> Self {
        let mut profile = Self::default();
        for &index in nodes {
            match tree.node(index) {
                PharmacophoreNode::Feature(feature) => {
                    for (acc, w) in profile
                        .functionalities
                        .iter_mut()
                        .zip(feature.functionalities.iter())
                    {
                        *acc += w;
                    }
                    profile.size += feature.size;
                    profile.feature_count += 1;
                }
                PharmacophoreNode::Link { .. } => profile.link_count += 1,
            }
        }
        profile
    }

    pub fn is_empty(&self) -> bool {
        self.feature_count == 0 && self.link_count == 0
    }

    pub fn similarity(&self, other: &Self) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        if self.feature_count == 0 || other.feature_count == 0 {
            return LINK_PLACEHOLDER_SIMILARITY;
        }

        let (overlap, union) = self
            .functionalities
            .iter()
            .zip(other.functionalities.iter())
            .fold((0.0, 0.0), |(min_sum, max_sum), (a, b)| {
                (min_sum + a.min(*b), max_sum + a.max(*b))
            });
        let functionality_similarity = if union > 0.0 { overlap / union } else { 1.0 };

        let larger = self.size.max(other.size);
        let size_similarity = if larger > 0.0 {
            self.size.min(other.size) / larger
        } else {
            1.0
        };

        (0.5 * (functionality_similarity + size_similarity)).clamp(0.0, 1.0)
    }
}

/// Similarity of two node sets drawn from (possibly different) trees.
pub fn node_set_similarity(
    tree1: &PharmacophoreTree,
    nodes1: &[usize],
    tree2: &PharmacophoreTree,
    nodes2: &[usize],
) -> f64 {
    FeatureProfile::from_nodes(tree1, nodes1).similarity(&FeatureProfile::from_nodes(tree2, nodes2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::node::{FeatureNode, Functionality};

    fn node(kind: Functionality, weight: f64, size: f64) -> PharmacophoreNode {
        let mut w = [0.0; FUNCTIONALITY_DIMENSIONS];
        w[kind.index()] = weight;
        FeatureNode::new(w, size).into()
    }

    fn tree() -> PharmacophoreTree {
        PharmacophoreTree::new(
            vec![
                node(Functionality::Aromatic, 1.0, 6.0),
                node(Functionality::Aromatic, 1.0, 6.0),
                node(Functionality::Donor, 1.0, 2.0),
                PharmacophoreNode::Link { linker_id: 1 },
            ],
            vec![(0, 1), (1, 2), (2, 3)],
        )
        .unwrap()
    }

    #[test]
    fn identical_sets_score_one() {
        let t = tree();
        assert!((node_set_similarity(&t, &[0], &t, &[1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn different_functionality_and_size_lowers_score() {
        let t = tree();
        let sim = node_set_similarity(&t, &[0], &t, &[2]);
        // no overlap in functionality, size ratio 2/6
        assert!((sim - 0.5 * (0.0 + 2.0 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn empty_side_scores_zero() {
        let t = tree();
        assert_eq!(node_set_similarity(&t, &[], &t, &[0]), 0.0);
        assert_eq!(node_set_similarity(&t, &[1], &t, &[]), 0.0);
    }

    #[test]
    fn link_only_side_scores_neutral() {
        let t = tree();
        assert_eq!(
            node_set_similarity(&t, &[3], &t, &[0, 1]),
            LINK_PLACEHOLDER_SIMILARITY
        );
    }

    #[test]
    fn profile_sums_features_and_counts_links() {
        let t = tree();
        let profile = FeatureProfile::from_nodes(&t, &[0, 2, 3]);
        assert_eq!(profile.size, 8.0);
        assert_eq!(profile.feature_count, 2);
        assert_eq!(profile.link_count, 1);
        assert_eq!(profile.functionalities[Functionality::Aromatic.index()], 1.0);
        assert_eq!(profile.functionalities[Functionality::Donor.index()], 1.0);
    }

    #[test]
    fn similarity_stays_in_unit_interval() {
        let t = tree();
        let sets: [&[usize]; 5] = [&[0], &[1, 2], &[2, 3], &[0, 1, 2, 3], &[3]];
        for a in sets {
            for b in sets {
                let sim = node_set_similarity(&t, a, &t, b);
                assert!((0.0..=1.0).contains(&sim));
            }
        }
    }
}

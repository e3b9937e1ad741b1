use super::ids::LinkerId;
use super::node::PharmacophoreNode;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("A pharmacophore tree needs at least one node")]
    Empty,
    #[error("A tree with {nodes} node(s) must have {expected} edge(s), found {found}")]
    EdgeCount {
        nodes: usize,
        expected: usize,
        found: usize,
    },
    #[error("Edge {edge} references node {node}, but the tree only has {nodes} node(s)")]
    NodeOutOfRange {
        edge: usize,
        node: usize,
        nodes: usize,
    },
    #[error("Edge {edge} connects node {node} to itself")]
    SelfLoop { edge: usize, node: usize },
    #[error("The graph is not connected: node {node} is unreachable from node 0")]
    Disconnected { node: usize },
}

/// Which side of a cut edge a rooted subtree lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CutDirection {
    /// The side containing the first endpoint of the edge.
    Left,
    /// The side containing the second endpoint of the edge.
    Right,
}

impl CutDirection {
    pub const BOTH: [CutDirection; 2] = [CutDirection::Left, CutDirection::Right];

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            CutDirection::Left => CutDirection::Right,
            CutDirection::Right => CutDirection::Left,
        }
    }
}

/// An edge of a tree together with the side that is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cut {
    pub edge: usize,
    pub direction: CutDirection,
}

impl Cut {
    pub fn new(edge: usize, direction: CutDirection) -> Self {
        Self { edge, direction }
    }

    /// The other side of the same edge.
    pub fn complement(self) -> Self {
        Self {
            edge: self.edge,
            direction: self.direction.opposite(),
        }
    }
}

/// The part of a tree on one side of a cut, rooted at the endpoint of the cut edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootedSubtree {
    pub head: usize,
    /// The cut edge bounding this subtree, `None` when the whole tree is taken.
    pub boundary: Option<usize>,
    /// Nodes in breadth-first order, head first.
    pub nodes: Vec<usize>,
    /// Edges in breadth-first discovery order.
    pub edges: Vec<usize>,
    /// Parent edge of each entry of `edges`; `None` for edges leaving the head.
    pub edge_parents: Vec<Option<usize>>,
}

impl RootedSubtree {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// A frontier one level further from the head of a rooted subtree.
///
/// `extension` holds the nodes between the head and the frontier (head included),
/// `sources` the cuts rooting each subtree that lies beyond the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionCut {
    pub extension: Vec<usize>,
    pub sources: Vec<Cut>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PharmacophoreTree {
    nodes: Vec<PharmacophoreNode>,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl PharmacophoreTree {
    pub fn new(
        nodes: Vec<PharmacophoreNode>,
        edges: Vec<(usize, usize)>,
    ) -> Result<Self, TreeError> {
        if nodes.is_empty() {
            return Err(TreeError::Empty);
        }
        if edges.len() + 1 != nodes.len() {
            return Err(TreeError::EdgeCount {
                nodes: nodes.len(),
                expected: nodes.len() - 1,
                found: edges.len(),
            });
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (edge, &(a, b)) in edges.iter().enumerate() {
            for node in [a, b] {
                if node >= nodes.len() {
                    return Err(TreeError::NodeOutOfRange {
                        edge,
                        node,
                        nodes: nodes.len(),
                    });
                }
            }
            if a == b {
                return Err(TreeError::SelfLoop { edge, node: a });
            }
            adjacency[a].push((b, edge));
            adjacency[b].push((a, edge));
        }

        let mut seen = vec![false; nodes.len()];
        let mut queue = VecDeque::from([0]);
        seen[0] = true;
        while let Some(node) = queue.pop_front() {
            for &(next, _) in &adjacency[node] {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        if let Some(node) = seen.iter().position(|&s| !s) {
            return Err(TreeError::Disconnected { node });
        }

        Ok(Self {
            nodes,
            edges,
            adjacency,
        })
    }

    pub fn nodes(&self) -> &[PharmacophoreNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &PharmacophoreNode {
        &self.nodes[index]
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> (usize, usize) {
        self.edges[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// `(neighbor, edge)` pairs of a node.
    pub fn neighbors(&self, node: usize) -> &[(usize, usize)] {
        &self.adjacency[node]
    }

    /// All link placeholders as `(node index, linker id)`.
    pub fn link_nodes(&self) -> impl Iterator<Item = (usize, LinkerId)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.linker_id().map(|id| (i, id)))
    }

    pub fn contains_link_node(&self, nodes: &[usize]) -> bool {
        nodes.iter().any(|&n| self.nodes[n].is_link_node())
    }

    pub fn total_size(&self, nodes: &[usize]) -> f64 {
        nodes.iter().map(|&n| self.nodes[n].size()).sum()
    }

    pub fn head_of(&self, cut: Cut) -> usize {
        let (a, b) = self.edges[cut.edge];
        match cut.direction {
            CutDirection::Left => a,
            CutDirection::Right => b,
        }
    }

    /// The cut on `edge` whose subtree is rooted at `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not an endpoint of `edge`.
    pub fn cut_toward(&self, edge: usize, node: usize) -> Cut {
        let (a, b) = self.edges[edge];
        if node == a {
            Cut::new(edge, CutDirection::Left)
        } else {
            assert_eq!(node, b, "node {node} is not an endpoint of edge {edge}");
            Cut::new(edge, CutDirection::Right)
        }
    }

    /// The rooted subtree on the kept side of a cut.
    pub fn subtree(&self, cut: Cut) -> RootedSubtree {
        self.traverse(self.head_of(cut), Some(cut.edge))
    }

    /// The whole tree as a breadth-first subtree rooted at `root`.
    pub fn bfs_subtree(&self, root: usize) -> RootedSubtree {
        self.traverse(root, None)
    }

    fn traverse(&self, head: usize, boundary: Option<usize>) -> RootedSubtree {
        let mut nodes = vec![head];
        let mut edges = Vec::new();
        let mut edge_parents = Vec::new();
        let mut queue = VecDeque::from([(head, boundary, None)]);

        while let Some((node, via, parent)) = queue.pop_front() {
            for &(next, edge) in &self.adjacency[node] {
                if Some(edge) == via {
                    continue;
                }
                nodes.push(next);
                edges.push(edge);
                edge_parents.push(parent);
                queue.push_back((next, Some(edge), Some(edge)));
            }
        }

        RootedSubtree {
            head,
            boundary,
            nodes,
            edges,
            edge_parents,
        }
    }

    fn child_cuts(&self, node: usize, via: Option<usize>) -> Vec<(Cut, usize)> {
        self.adjacency[node]
            .iter()
            .filter(|&&(_, edge)| Some(edge) != via)
            .map(|&(child, edge)| (self.cut_toward(edge, child), child))
            .collect()
    }

    /// Candidate frontiers one level further out from the head of `subtree`.
    ///
    /// Produces the frontier formed by the head's child edges, every frontier that
    /// absorbs exactly one child of the head, and (for heads with several children)
    /// the frontier that absorbs all of them. Extensions never contain link nodes.
    pub fn extension_cuts(&self, subtree: &RootedSubtree) -> Vec<ExtensionCut> {
        let head = subtree.head;
        if self.nodes[head].is_link_node() {
            return Vec::new();
        }
        let head_children = self.child_cuts(head, subtree.boundary);
        if head_children.is_empty() {
            return Vec::new();
        }

        let mut cuts = vec![ExtensionCut {
            extension: vec![head],
            sources: head_children.iter().map(|&(cut, _)| cut).collect(),
        }];

        for (i, &(cut, child)) in head_children.iter().enumerate() {
            if self.nodes[child].is_link_node() {
                continue;
            }
            let mut sources: Vec<Cut> = head_children
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &(other, _))| other)
                .collect();
            sources.extend(self.child_cuts(child, Some(cut.edge)).into_iter().map(|(c, _)| c));
            cuts.push(ExtensionCut {
                extension: vec![head, child],
                sources,
            });
        }

        let absorbs_all = head_children.len() > 1
            && head_children
                .iter()
                .all(|&(_, child)| !self.nodes[child].is_link_node());
        if absorbs_all {
            let mut extension = vec![head];
            let mut sources = Vec::new();
            for &(cut, child) in &head_children {
                extension.push(child);
                sources.extend(self.child_cuts(child, Some(cut.edge)).into_iter().map(|(c, _)| c));
            }
            cuts.push(ExtensionCut { extension, sources });
        }

        cuts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::node::{FUNCTIONALITY_DIMENSIONS, FeatureNode};

    fn feature(size: f64) -> PharmacophoreNode {
        FeatureNode::new([0.0; FUNCTIONALITY_DIMENSIONS], size).into()
    }

    // 0 - 1 - 2
    //     |
    //     3 - 4(link)
    fn branched_tree() -> PharmacophoreTree {
        PharmacophoreTree::new(
            vec![
                feature(1.0),
                feature(2.0),
                feature(3.0),
                feature(1.0),
                PharmacophoreNode::Link { linker_id: 7 },
            ],
            vec![(0, 1), (1, 2), (1, 3), (3, 4)],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_wrong_edge_count() {
        let err = PharmacophoreTree::new(vec![feature(1.0), feature(1.0)], vec![]).unwrap_err();
        assert_eq!(
            err,
            TreeError::EdgeCount {
                nodes: 2,
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn new_rejects_out_of_range_and_self_loop_edges() {
        let err = PharmacophoreTree::new(vec![feature(1.0), feature(1.0)], vec![(0, 5)]).unwrap_err();
        assert!(matches!(err, TreeError::NodeOutOfRange { node: 5, .. }));
        let err = PharmacophoreTree::new(vec![feature(1.0), feature(1.0)], vec![(1, 1)]).unwrap_err();
        assert_eq!(err, TreeError::SelfLoop { edge: 0, node: 1 });
    }

    #[test]
    fn new_rejects_disconnected_graph_with_cycle() {
        let err = PharmacophoreTree::new(
            vec![feature(1.0), feature(1.0), feature(1.0), feature(1.0)],
            vec![(0, 1), (1, 2), (2, 0)],
        )
        .unwrap_err();
        assert_eq!(err, TreeError::Disconnected { node: 3 });
    }

    #[test]
    fn new_rejects_empty_tree() {
        assert_eq!(PharmacophoreTree::new(vec![], vec![]).unwrap_err(), TreeError::Empty);
    }

    #[test]
    fn subtree_follows_cut_direction() {
        let tree = branched_tree();
        let left = tree.subtree(Cut::new(0, CutDirection::Left));
        assert_eq!(left.head, 0);
        assert_eq!(left.nodes, vec![0]);
        assert!(left.edges.is_empty());

        let right = tree.subtree(Cut::new(0, CutDirection::Right));
        assert_eq!(right.head, 1);
        assert_eq!(right.nodes, vec![1, 2, 3, 4]);
        assert_eq!(right.edges, vec![1, 2, 3]);
        assert_eq!(right.edge_parents, vec![None, None, Some(2)]);
    }

    #[test]
    fn complementary_cuts_partition_the_tree() {
        let tree = branched_tree();
        for edge in 0..tree.edge_count() {
            let cut = Cut::new(edge, CutDirection::Left);
            let mut all = tree.subtree(cut).nodes;
            all.extend(tree.subtree(cut.complement()).nodes);
            all.sort();
            assert_eq!(all, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn bfs_subtree_covers_whole_tree() {
        let tree = branched_tree();
        let subtree = tree.bfs_subtree(3);
        assert_eq!(subtree.head, 3);
        assert_eq!(subtree.node_count(), 5);
        assert_eq!(subtree.edges.len(), 4);
    }

    #[test]
    fn cut_toward_points_at_requested_endpoint() {
        let tree = branched_tree();
        assert_eq!(tree.cut_toward(3, 4), Cut::new(3, CutDirection::Right));
        assert_eq!(tree.cut_toward(3, 3), Cut::new(3, CutDirection::Left));
        assert_eq!(tree.head_of(tree.cut_toward(1, 2)), 2);
    }

    #[test]
    fn extension_cuts_grow_one_level_and_skip_link_nodes() {
        let tree = branched_tree();
        let subtree = tree.subtree(Cut::new(0, CutDirection::Right));
        let cuts = tree.extension_cuts(&subtree);

        assert_eq!(cuts.len(), 4);
        assert_eq!(cuts[0].extension, vec![1]);
        assert_eq!(
            cuts[0].sources,
            vec![tree.cut_toward(1, 2), tree.cut_toward(2, 3)]
        );
        assert_eq!(cuts[1].extension, vec![1, 2]);
        assert_eq!(cuts[1].sources, vec![tree.cut_toward(2, 3)]);
        assert_eq!(cuts[2].extension, vec![1, 3]);
        assert_eq!(
            cuts[2].sources,
            vec![tree.cut_toward(1, 2), tree.cut_toward(3, 4)]
        );
        assert_eq!(cuts[3].extension, vec![1, 2, 3]);
        assert_eq!(cuts[3].sources, vec![tree.cut_toward(3, 4)]);
        for cut in &cuts {
            assert!(!tree.contains_link_node(&cut.extension));
        }
    }

    #[test]
    fn extension_cuts_are_empty_for_leaves_and_link_heads() {
        let tree = branched_tree();
        let leaf = tree.subtree(Cut::new(1, CutDirection::Right));
        assert!(tree.extension_cuts(&leaf).is_empty());
        let link = tree.subtree(tree.cut_toward(3, 4));
        assert!(tree.extension_cuts(&link).is_empty());
    }

    #[test]
    fn link_nodes_lists_placeholders() {
        let tree = branched_tree();
        assert_eq!(tree.link_nodes().collect::<Vec<_>>(), vec![(4, 7)]);
        assert!(tree.contains_link_node(&[3, 4]));
        assert_eq!(tree.total_size(&[0, 1, 4]), 3.0);
    }
}

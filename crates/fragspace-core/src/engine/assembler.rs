use super::cache::{CellKey, EdgeLinkCache};
use super::context::SearchContext;
use super::progress::Progress;
use super::result::{FragmentMatching, PartialSolution, SearchResult};
use crate::core::matching::feature::aggregate_similarity;
use crate::core::models::hit::{Hit, HitList};
use crate::core::models::ids::SynthonId;
use crate::core::models::synthon::Synthon;
use crate::core::reaction::ReactionEngine;
use tracing::{debug, instrument, trace};

/// Two cells on opposite sides of the same bond-forming cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPair {
    pub left: CellKey,
    pub right: CellKey,
}

/// Every complementary pair of cached cells, each unordered pair listed once.
pub fn complementary_pairs(context: &SearchContext, cache: &EdgeLinkCache) -> Vec<CellPair> {
    let mut pairs = Vec::new();
    for left in cache.sorted_keys() {
        for partner in context.index.partner_positions(left.linker_id, left.position) {
            if partner <= left.position {
                continue;
            }
            let right = left.complementary(partner);
            if cache.contains(&right) {
                pairs.push(CellPair { left, right });
            }
        }
    }
    pairs
}

/// Scores, reacts and deduplicates every tuple reachable from the complementary cell pairs.
#[instrument(skip_all, name = "assembly")]
pub fn run(
    context: &SearchContext,
    cache: &EdgeLinkCache,
    engine: &dyn ReactionEngine,
) -> HitList {
    let pairs = complementary_pairs(context, cache);
    context.reporter.report(Progress::TaskStart {
        total_steps: pairs.len() as u64,
    });

    let mut hits = HitList::new();
    let mut accepted = 0usize;
    for pair in &pairs {
        if let (Some(left), Some(right)) = (cache.get(&pair.left), cache.get(&pair.right)) {
            accepted += assemble_pair(context, &left, &right, engine, &mut hits);
        }
        context.reporter.report(Progress::TaskIncrement);
    }
    context.reporter.report(Progress::TaskFinish);

    debug!(
        pairs = pairs.len(),
        accepted,
        unique = hits.len(),
        "Assembly finished."
    );
    hits
}

/// Combines two complementary cells. Returns the number of accepted tuples.
pub fn assemble_pair(
    context: &SearchContext,
    left: &SearchResult,
    right: &SearchResult,
    engine: &dyn ReactionEngine,
    hits: &mut HitList,
) -> usize {
    let nms = context.null_match_scaling();
    let threshold = context.pruning_threshold();
    let mut accepted = 0;

    for (i, l) in left.entries().iter().enumerate() {
        for (j, r) in right.entries().iter().enumerate() {
            let estimate = best_path_similarity(l, r, nms);
            if estimate < threshold {
                // heuristic exit: entries are ranked by their own similarity, which only
                // approximates their size-weighted contribution to the pair
                if j == 0 {
                    trace!(left_rank = i, "Remaining left entries fall below threshold.");
                    return accepted;
                }
                break;
            }
            accepted += expand_and_score(context, l, r, engine, hits);
        }
    }
    accepted
}

fn best_path_similarity(left: &FragmentMatching, right: &FragmentMatching, nms: f64) -> f64 {
    let mut matches = left.tree.best_feature_matches();
    matches.extend(right.tree.best_feature_matches());
    aggregate_similarity(&matches, nms)
}

fn expand_and_score(
    context: &SearchContext,
    left: &FragmentMatching,
    right: &FragmentMatching,
    engine: &dyn ReactionEngine,
    hits: &mut HitList,
) -> usize {
    let nms = context.null_match_scaling();
    let left_solutions = left.construct_solutions();
    let right_solutions = right.construct_solutions();
    let mut accepted = 0;

    for l in &left_solutions {
        for r in &right_solutions {
            let similarity = tuple_similarity(l, r, nms);
            if similarity < context.cutoff {
                trace!(similarity, "Tuple below cutoff.");
                continue;
            }
            let Some(synthons) = complete_tuple(context, l, r) else {
                trace!("Tuple does not cover every position exactly once.");
                continue;
            };
            if let Some(hit) = react(context, engine, &synthons, similarity) {
                hits.offer(hit);
                accepted += 1;
            }
        }
    }
    accepted
}

fn tuple_similarity(left: &PartialSolution, right: &PartialSolution, nms: f64) -> f64 {
    aggregate_similarity(left.matches.iter().chain(right.matches.iter()), nms)
}

/// Synthons in position order, or `None` when a position is missing or filled twice.
fn complete_tuple<'a>(
    context: &SearchContext<'a>,
    left: &PartialSolution,
    right: &PartialSolution,
) -> Option<Vec<&'a Synthon>> {
    let positions = context.reaction.position_count();
    let mut slots: Vec<Option<SynthonId>> = vec![None; positions];
    for &(position, id) in left.synthons.iter().chain(right.synthons.iter()) {
        let slot = slots.get_mut(position)?;
        if slot.is_some() {
            return None;
        }
        *slot = Some(id);
    }
    slots
        .into_iter()
        .map(|slot| slot.and_then(|id| context.reaction.synthon(id)))
        .collect()
}

fn react(
    context: &SearchContext,
    engine: &dyn ReactionEngine,
    synthons: &[&Synthon],
    similarity: f64,
) -> Option<Hit> {
    let reaction_id = context.reaction.id.as_str();
    let Some(product) = engine.react(reaction_id, synthons) else {
        debug!(reaction = reaction_id, "Reaction engine could not build a product.");
        return None;
    };
    let synthon_ids = synthons.iter().map(|s| s.id.clone()).collect();
    Some(Hit::new(&product.id_code, synthon_ids, reaction_id, similarity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matching::feature::FeatureMatch;
    use crate::core::models::node::{FUNCTIONALITY_DIMENSIONS, FeatureNode, PharmacophoreNode};
    use crate::core::models::synthon::SynthonReaction;
    use crate::core::models::tree::{Cut, CutDirection, PharmacophoreTree};
    use crate::core::reaction::{JoinedSynthonEngine, Product};
    use crate::engine::config::SearchConfig;
    use crate::engine::linker_index::LinkerIndex;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::result::MatchTree;

    fn tree() -> PharmacophoreTree {
        PharmacophoreTree::new(
            vec![
                FeatureNode::new([0.0; FUNCTIONALITY_DIMENSIONS], 1.0).into(),
                PharmacophoreNode::Link { linker_id: 1 },
            ],
            vec![(0, 1)],
        )
        .unwrap()
    }

    fn reaction() -> (SynthonReaction, Vec<SynthonId>) {
        let mut reaction = SynthonReaction::new("amide", 2);
        let ids = vec![
            reaction.add_synthon(Synthon::new("a1", 0, "A1", tree())).unwrap(),
            reaction.add_synthon(Synthon::new("a2", 0, "A2", tree())).unwrap(),
            reaction.add_synthon(Synthon::new("b1", 1, "B1", tree())).unwrap(),
        ];
        (reaction, ids)
    }

    fn entry(id: SynthonId, position: usize, similarity: f64) -> FragmentMatching {
        let tree = MatchTree::Leaf([FeatureMatch::new(similarity, 1.0, 1.0)].into_iter().collect());
        FragmentMatching::new(id, position, 1, tree)
    }

    fn entry_with(id: SynthonId, position: usize, matches: Vec<FeatureMatch>) -> FragmentMatching {
        FragmentMatching::new(id, position, 1, MatchTree::Leaf(matches.into_iter().collect()))
    }

    fn cell(entries: Vec<FragmentMatching>) -> SearchResult {
        let mut result = SearchResult::new(10);
        for e in entries {
            result.add_result(e, 0.7);
        }
        result
    }

    struct Refusing;

    impl ReactionEngine for Refusing {
        fn react(&self, _reaction_id: &str, _synthons: &[&Synthon]) -> Option<Product> {
            None
        }
    }

    #[test]
    fn assemble_pair_accepts_tuples_at_or_above_cutoff() {
        let (reaction, ids) = reaction();
        let index = LinkerIndex::build(&reaction);
        let query = tree();
        let config = SearchConfig::default();
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(&reaction, &index, &query, &config, &reporter, 0.6);

        let left = cell(vec![entry(ids[0], 0, 0.9), entry(ids[1], 0, 0.2)]);
        let right = cell(vec![entry(ids[2], 1, 0.7)]);
        let mut hits = HitList::new();
        let accepted = assemble_pair(&context, &left, &right, &JoinedSynthonEngine, &mut hits);

        assert_eq!(accepted, 1);
        let hit = hits.get("A1.B1____a1____b1____amide").unwrap();
        assert!((hit.similarity - 0.8).abs() < 1e-12);
    }

    #[test]
    fn tuples_missing_a_position_are_rejected() {
        let (reaction, ids) = reaction();
        let index = LinkerIndex::build(&reaction);
        let query = tree();
        let config = SearchConfig::default();
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(&reaction, &index, &query, &config, &reporter, 0.0);

        let left = cell(vec![entry(ids[0], 0, 1.0)]);
        let same_position = cell(vec![entry(ids[1], 0, 1.0)]);
        let mut hits = HitList::new();
        let accepted =
            assemble_pair(&context, &left, &same_position, &JoinedSynthonEngine, &mut hits);
        assert_eq!(accepted, 0);
        assert!(hits.is_empty());
    }

    #[test]
    fn failed_reactions_produce_no_hits() {
        let (reaction, ids) = reaction();
        let index = LinkerIndex::build(&reaction);
        let query = tree();
        let config = SearchConfig::default();
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(&reaction, &index, &query, &config, &reporter, 0.0);

        let left = cell(vec![entry(ids[0], 0, 1.0)]);
        let right = cell(vec![entry(ids[2], 1, 1.0)]);
        let mut hits = HitList::new();
        assert_eq!(assemble_pair(&context, &left, &right, &Refusing, &mut hits), 0);
        assert!(hits.is_empty());
    }

    #[test]
    fn complementary_pairs_link_opposite_directions_once() {
        let (reaction, _) = reaction();
        let index = LinkerIndex::build(&reaction);
        let query = tree();
        let config = SearchConfig::default();
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(&reaction, &index, &query, &config, &reporter, 0.0);

        let mut cache = EdgeLinkCache::new();
        for position in 0..2 {
            for direction in CutDirection::BOTH {
                let key = CellKey::new(1, position, Cut::new(0, direction));
                cache.insert(key, SearchResult::new(1));
            }
        }
        let pairs = complementary_pairs(&context, &cache);
        assert_eq!(pairs.len(), 2);
        for pair in &pairs {
            assert_eq!(pair.left.position, 0);
            assert_eq!(pair.right.position, 1);
            assert_eq!(pair.left.cut, pair.right.cut.complement());
        }
    }

    #[test]
    fn assembly_stops_at_the_first_left_entry_estimated_below_threshold() {
        let (reaction, ids) = reaction();
        let index = LinkerIndex::build(&reaction);
        let query = tree();
        let config = SearchConfig::default();
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(&reaction, &index, &query, &config, &reporter, 0.6);

        // small, good fragment: ranks first on its own (0.7) but weighs little in the pair
        let small = entry_with(ids[0], 0, vec![FeatureMatch::new(0.7, 0.1, 0.1)]);
        // large fragment with uncovered nodes: own similarity 4 / 6.1
        let large = entry_with(
            ids[1],
            0,
            vec![FeatureMatch::new(1.0, 4.0, 4.0), FeatureMatch::new(0.0, 0.0, 3.0)],
        );
        let right = cell(vec![entry_with(
            ids[2],
            1,
            vec![FeatureMatch::new(1.0, 1.0, 1.0), FeatureMatch::new(0.0, 3.0, 0.0)],
        )]);

        let left = cell(vec![small, large.clone()]);
        assert_eq!(left.entries()[0].synthon, ids[0]);
        let mut hits = HitList::new();
        // small + right estimates 1.07 / 3.2, below 0.6 - 0.2, so large is never tried
        assert_eq!(assemble_pair(&context, &left, &right, &JoinedSynthonEngine, &mut hits), 0);
        assert!(hits.is_empty());

        let mut hits = HitList::new();
        let alone = cell(vec![large]);
        assert_eq!(assemble_pair(&context, &alone, &right, &JoinedSynthonEngine, &mut hits), 1);
        let hit = hits.get("A2.B1____a2____b1____amide").unwrap();
        assert!((hit.similarity - 0.625).abs() < 1e-12);
    }
}

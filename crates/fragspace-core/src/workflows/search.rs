use crate::core::models::hit::{Hit, HitList};
use crate::core::models::synthon::SynthonReaction;
use crate::core::models::tree::{Cut, CutDirection, PharmacophoreTree};
use crate::core::reaction::ReactionEngine;
use crate::engine::assembler;
use crate::engine::cache::CellKey;
use crate::engine::config::SearchConfig;
use crate::engine::context::SearchContext;
use crate::engine::error::EngineError;
use crate::engine::linker_index::LinkerIndex;
use crate::engine::matcher::SubtreeMatcher;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

/// Fragment-space search over the synthons of one reaction.
///
/// The linker index is built once on construction; every call to
/// [`FragmentSearch::search`] starts from an empty edge-link cache, so repeated
/// searches with the same inputs return the same hits.
#[derive(Debug, Clone)]
pub struct FragmentSearch<'a> {
    reaction: &'a SynthonReaction,
    index: LinkerIndex,
    config: SearchConfig,
}

impl<'a> FragmentSearch<'a> {
    pub fn new(reaction: &'a SynthonReaction, config: SearchConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let index = LinkerIndex::build(reaction);
        Ok(Self {
            reaction,
            index,
            config,
        })
    }

    pub fn reaction(&self) -> &SynthonReaction {
        self.reaction
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Hits with similarity at or above `cutoff`, best first.
    pub fn search(
        &self,
        query: &PharmacophoreTree,
        cutoff: f64,
        engine: &dyn ReactionEngine,
        reporter: &ProgressReporter,
    ) -> Result<Vec<Hit>, EngineError> {
        Ok(self.search_hit_list(query, cutoff, engine, reporter)?.into_sorted())
    }

    #[instrument(skip_all, name = "fragment_search", fields(reaction = %self.reaction.id, cutoff = cutoff))]
    pub fn search_hit_list(
        &self,
        query: &PharmacophoreTree,
        cutoff: f64,
        engine: &dyn ReactionEngine,
        reporter: &ProgressReporter,
    ) -> Result<HitList, EngineError> {
        validate_cutoff(cutoff)?;

        if query.edge_count() == 0 {
            warn!("Query tree has no edges; there is nothing to split into fragments.");
            return Ok(HitList::new());
        }
        if self.index.is_empty() {
            warn!("Reaction exposes no indexed linkers; no fragments can be matched.");
            return Ok(HitList::new());
        }

        let context = SearchContext::new(
            self.reaction,
            &self.index,
            query,
            &self.config,
            reporter,
            cutoff,
        );

        // === Phase 1: Fill the edge-link cache ===
        let matcher = reporter.phase("Matching Fragments", || {
            let keys = self.cell_keys(query);
            info!(cells = keys.len(), "Matching query subtrees against synthons.");
            reporter.report(Progress::TaskStart {
                total_steps: keys.len() as u64,
            });
            let mut matcher = SubtreeMatcher::new(context);
            for key in keys {
                matcher.cell(key);
                reporter.report(Progress::TaskIncrement);
            }
            reporter.report(Progress::TaskFinish);
            matcher
        });
        if matcher.cell_limit_reached() {
            reporter.message("Cell limit reached; results may be incomplete.");
        }

        // === Phase 2: Assemble products ===
        let hits = reporter.phase("Assembling Products", || {
            assembler::run(&context, matcher.cache(), engine)
        });

        info!(
            hits = hits.len(),
            cached_cells = matcher.cache().len(),
            "Search complete."
        );
        Ok(hits)
    }

    fn cell_keys(&self, query: &PharmacophoreTree) -> Vec<CellKey> {
        let cells: Vec<_> = self.index.cells().collect();
        let mut keys = Vec::with_capacity(query.edge_count() * 2 * cells.len());
        for edge in 0..query.edge_count() {
            for direction in CutDirection::BOTH {
                let cut = Cut::new(edge, direction);
                for &(linker_id, position) in &cells {
                    keys.push(CellKey::new(linker_id, position, cut));
                }
            }
        }
        keys
    }
}

pub(crate) fn validate_cutoff(cutoff: f64) -> Result<(), EngineError> {
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(EngineError::InvalidCutoff(cutoff));
    }
    Ok(())
}

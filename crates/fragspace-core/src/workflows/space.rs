use super::search::{FragmentSearch, validate_cutoff};
use crate::core::models::hit::{Hit, HitList};
use crate::core::models::synthon::{SynthonLibrary, SynthonReaction};
use crate::core::models::tree::PharmacophoreTree;
use crate::core::reaction::ReactionEngine;
use crate::engine::config::SearchConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

type ReactionResult = Result<HitList, EngineError>;

/// Searches every reaction of `library` and merges the hits.
///
/// Each reaction gets its own [`FragmentSearch`]; a product reachable through several
/// reactions appears once per reaction since the key contains the reaction id.
#[instrument(skip_all, name = "space_search", fields(cutoff = cutoff))]
pub fn run(
    query: &PharmacophoreTree,
    library: &SynthonLibrary,
    config: &SearchConfig,
    cutoff: f64,
    engine: &dyn ReactionEngine,
    reporter: &ProgressReporter,
) -> Result<Vec<Hit>, EngineError> {
    validate_cutoff(cutoff)?;
    config.validate()?;

    let reactions = library.reactions();
    if reactions.is_empty() {
        warn!("Synthon library contains no reactions.");
        return Ok(Vec::new());
    }
    info!(
        reactions = reactions.len(),
        synthons = library.synthon_count(),
        "Starting space-wide search."
    );

    let results = reporter.phase("Searching Reactions", || {
        reporter.report(Progress::TaskStart {
            total_steps: reactions.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = reactions.iter();

        #[cfg(feature = "parallel")]
        let iterator = reactions.par_iter();

        let results: Vec<ReactionResult> = iterator
            .map(|reaction| {
                let result = search_reaction(reaction, query, config, cutoff, engine);
                reporter.report(Progress::TaskIncrement);
                result
            })
            .collect();

        reporter.report(Progress::TaskFinish);
        results
    });

    let mut hits = HitList::new();
    for result in results {
        hits.merge(result?);
    }
    info!(hits = hits.len(), "Space-wide search complete.");
    Ok(hits.into_sorted())
}

fn search_reaction(
    reaction: &SynthonReaction,
    query: &PharmacophoreTree,
    config: &SearchConfig,
    cutoff: f64,
    engine: &dyn ReactionEngine,
) -> ReactionResult {
    let search = FragmentSearch::new(reaction, config.clone())?;
    search.search_hit_list(query, cutoff, engine, &ProgressReporter::new())
}

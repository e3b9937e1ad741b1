use super::config::SearchConfig;
use super::linker_index::LinkerIndex;
use super::progress::ProgressReporter;
use crate::core::models::synthon::SynthonReaction;
use crate::core::models::tree::PharmacophoreTree;

/// Read-only state shared by every stage of one search over one reaction.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub reaction: &'a SynthonReaction,
    pub index: &'a LinkerIndex,
    pub query: &'a PharmacophoreTree,
    pub config: &'a SearchConfig,
    pub reporter: &'a ProgressReporter<'a>,
    pub cutoff: f64,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        reaction: &'a SynthonReaction,
        index: &'a LinkerIndex,
        query: &'a PharmacophoreTree,
        config: &'a SearchConfig,
        reporter: &'a ProgressReporter<'a>,
        cutoff: f64,
    ) -> Self {
        Self {
            reaction,
            index,
            query,
            config,
            reporter,
            cutoff,
        }
    }

    /// Partial matches at or below this score are dropped before assembly.
    pub fn pruning_threshold(&self) -> f64 {
        self.cutoff - self.config.subtree_matching_buffer
    }

    pub fn null_match_scaling(&self) -> f64 {
        self.config.null_match_scaling
    }
}

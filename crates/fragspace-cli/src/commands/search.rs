use crate::cli::SearchArgs;
use crate::config::{AppConfig, PartialAppConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use fragspace::{
    core::{
        io::{hits::write_hits_csv, library::load_library, query::Query},
        models::hit::Hit,
        reaction::JoinedSynthonEngine,
    },
    engine::{error::EngineError, progress::ProgressReporter},
    workflows::{search::FragmentSearch, space},
};
use std::fs::File;
use std::io::{self, BufWriter};
use tracing::{info, warn};

pub fn run(args: SearchArgs, show_progress: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialAppConfig::from_file(path)?,
        None => PartialAppConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let hits = execute(&config, &reporter)?;

    if hits.is_empty() {
        warn!("Search completed but no product reached the cutoff.");
        eprintln!(
            "Warning: no hits at or above similarity {:.3}.",
            config.cutoff
        );
    }
    write_output(&config, &hits)?;

    if let Some(best) = hits.first() {
        eprintln!(
            "✓ {} hit(s) written; best {} (similarity {:.4}).",
            hits.len(),
            best.key,
            best.similarity
        );
    }
    Ok(())
}

/// Loads the inputs named in `config` and runs the search, returning hits best first
/// and truncated to `config.top`.
pub fn execute(config: &AppConfig, reporter: &ProgressReporter) -> Result<Vec<Hit>> {
    info!("Loading query from {:?}", &config.query_path);
    let query = Query::load(&config.query_path).map_err(EngineError::from)?;

    info!("Loading synthon library from {:?}", &config.library_path);
    let library = load_library(&config.library_path).map_err(EngineError::from)?;
    info!(
        reactions = library.reactions().len(),
        synthons = library.synthon_count(),
        "Synthon library loaded."
    );

    let engine = JoinedSynthonEngine;
    let mut hits = match &config.reaction {
        Some(id) => {
            let reaction = library
                .reaction(id)
                .ok_or_else(|| EngineError::ReactionNotFound(id.clone()))?;
            info!(reaction = %id, "Searching a single reaction.");
            FragmentSearch::new(reaction, config.search.clone())?.search(
                &query.tree,
                config.cutoff,
                &engine,
                reporter,
            )?
        }
        None => space::run(
            &query.tree,
            &library,
            &config.search,
            config.cutoff,
            &engine,
            reporter,
        )?,
    };

    if let Some(top) = config.top {
        hits.truncate(top);
    }
    info!(query = %query.name, hits = hits.len(), "Search finished.");
    Ok(hits)
}

fn write_output(config: &AppConfig, hits: &[Hit]) -> Result<()> {
    match &config.output_path {
        Some(path) => {
            info!("Writing {} hit(s) to {:?}", hits.len(), path);
            let file = File::create(path)?;
            write_hits_csv(hits, BufWriter::new(file)).map_err(|e| CliError::Output {
                target: path.display().to_string(),
                source: e.into(),
            })
        }
        None => write_hits_csv(hits, io::stdout().lock()).map_err(|e| CliError::Output {
            target: "stdout".to_string(),
            source: e.into(),
        }),
    }
}

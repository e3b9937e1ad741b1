use crate::cli::SearchArgs;
use crate::error::{CliError, Result};
use fragspace::engine::config::{SearchConfig, SearchConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_CUTOFF: f64 = 0.7;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSearchParams {
    n_best_solutions: Option<usize>,
    subtree_matching_buffer: Option<f64>,
    extension_matches: Option<usize>,
    alpha: Option<f64>,
    null_match_scaling: Option<f64>,
    match_balance: Option<f64>,
    match_size_limit: Option<f64>,
    match_node_nr_limit: Option<usize>,
    max_cells: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    cutoff: Option<f64>,
    reaction: Option<String>,
    search: Option<PartialSearchParams>,
}

/// Everything the `search` command needs after merging file, flags and `--set` values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub query_path: PathBuf,
    pub library_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub top: Option<usize>,
    pub cutoff: f64,
    pub reaction: Option<String>,
    pub search: SearchConfig,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Command-line flags take precedence over `--set` values, which take precedence
    /// over the file.
    pub fn merge_with_cli(mut self, args: &SearchArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;
        let params = self.search.take().unwrap_or_default();

        let mut builder = SearchConfigBuilder::new();
        if let Some(n) = args.n_best_solutions.or(params.n_best_solutions) {
            builder = builder.n_best_solutions(n);
        }
        if let Some(buffer) = params.subtree_matching_buffer {
            builder = builder.subtree_matching_buffer(buffer);
        }
        if let Some(n) = params.extension_matches {
            builder = builder.extension_matches(n);
        }
        if let Some(alpha) = params.alpha {
            builder = builder.alpha(alpha);
        }
        if let Some(scaling) = params.null_match_scaling {
            builder = builder.null_match_scaling(scaling);
        }
        if let Some(ratio) = params.match_balance {
            builder = builder.match_balance(ratio);
        }
        if let Some(limit) = params.match_size_limit {
            builder = builder.match_size_limit(limit);
        }
        if let Some(limit) = params.match_node_nr_limit {
            builder = builder.match_node_nr_limit(limit);
        }
        builder = builder.max_cells(args.max_cells.or(params.max_cells));

        let search = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let cutoff = args.cutoff.or(self.cutoff).unwrap_or(DEFAULT_CUTOFF);
        if !(0.0..=1.0).contains(&cutoff) {
            return Err(CliError::Config(format!(
                "The similarity cutoff must lie between 0 and 1, got {}.",
                cutoff
            )));
        }

        Ok(AppConfig {
            query_path: args.query.clone(),
            library_path: args.library.clone(),
            output_path: args.output.clone(),
            top: args.top,
            cutoff,
            reaction: args.reaction.clone().or(self.reaction),
            search,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value = value.trim();

            if key == "cutoff" {
                self.cutoff = Some(parse_value(key, value)?);
                continue;
            }
            if key == "reaction" {
                self.reaction = Some(value.to_string());
                continue;
            }

            let params = self.search.get_or_insert_with(Default::default);
            match key {
                "search.n-best-solutions" => params.n_best_solutions = Some(parse_value(key, value)?),
                "search.subtree-matching-buffer" => {
                    params.subtree_matching_buffer = Some(parse_value(key, value)?)
                }
                "search.extension-matches" => params.extension_matches = Some(parse_value(key, value)?),
                "search.alpha" => params.alpha = Some(parse_value(key, value)?),
                "search.null-match-scaling" => {
                    params.null_match_scaling = Some(parse_value(key, value)?)
                }
                "search.match-balance" => params.match_balance = Some(parse_value(key, value)?),
                "search.match-size-limit" => params.match_size_limit = Some(parse_value(key, value)?),
                "search.match-node-nr-limit" => {
                    params.match_node_nr_limit = Some(parse_value(key, value)?)
                }
                "search.max-cells" => params.max_cells = Some(parse_value(key, value)?),
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

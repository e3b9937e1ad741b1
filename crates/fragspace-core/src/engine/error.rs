use super::config::ConfigError;
use crate::core::io::library::LibraryLoadError;
use crate::core::io::query::QueryLoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid search configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Query loading failed: {source}")]
    Query {
        #[from]
        source: QueryLoadError,
    },

    #[error("Synthon library loading failed: {source}")]
    Library {
        #[from]
        source: LibraryLoadError,
    },

    #[error("Similarity cutoff must lie in [0, 1], got {0}")]
    InvalidCutoff(f64),

    #[error("Reaction '{0}' not found in the synthon library")]
    ReactionNotFound(String),
}

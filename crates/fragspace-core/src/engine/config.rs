use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Parameter '{name}' = {value} is outside its valid range {range}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },
}

/// Tunables of the subtree matcher and the combinatorial assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Length cap of every ranked match list in the edge-link cache.
    pub n_best_solutions: usize,
    /// Slack below the similarity cutoff within which partial matches are kept.
    pub subtree_matching_buffer: f64,
    /// Number of best-scoring extension-cut pairs that are explored recursively.
    pub extension_matches: usize,
    /// Weight of the extension node sets against the source node sets when ranking cut pairs.
    pub alpha: f64,
    /// Share of the larger side in the aggregation normalizer; at least 0.5.
    pub null_match_scaling: f64,
    /// Largest size ratio of two node sets still compared as a single feature match.
    pub match_balance: f64,
    /// Node sets smaller than this are matched directly.
    pub match_size_limit: f64,
    /// Node sets with fewer nodes than this are matched directly.
    pub match_node_nr_limit: usize,
    /// Stop computing new edge-link cache cells after this many.
    pub max_cells: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_best_solutions: 20,
            subtree_matching_buffer: 0.2,
            extension_matches: 3,
            alpha: 0.8,
            null_match_scaling: 0.7,
            match_balance: 2.0,
            match_size_limit: 4.0,
            match_node_nr_limit: 3,
            max_cells: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_best_solutions == 0 {
            return Err(ConfigError::OutOfRange {
                name: "n_best_solutions",
                value: 0.0,
                range: ">= 1",
            });
        }
        if self.extension_matches == 0 {
            return Err(ConfigError::OutOfRange {
                name: "extension_matches",
                value: 0.0,
                range: ">= 1",
            });
        }
        check_range("subtree_matching_buffer", self.subtree_matching_buffer, 0.0, 1.0, "[0, 1]")?;
        check_range("alpha", self.alpha, 0.0, 1.0, "[0, 1]")?;
        check_range("null_match_scaling", self.null_match_scaling, 0.5, 1.0, "[0.5, 1]")?;
        check_range("match_balance", self.match_balance, 1.0, f64::MAX, ">= 1")?;
        check_range("match_size_limit", self.match_size_limit, 0.0, f64::MAX, ">= 0")?;
        Ok(())
    }
}

fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
    range: &'static str,
) -> Result<(), ConfigError> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange { name, value, range });
    }
    Ok(())
}

#[derive(Default)]
pub struct SearchConfigBuilder {
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

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_best_solutions(mut self, n: usize) -> Self {
        self.n_best_solutions = Some(n);
        self
    }
    pub fn subtree_matching_buffer(mut self, buffer: f64) -> Self {
        self.subtree_matching_buffer = Some(buffer);
        self
    }
    pub fn extension_matches(mut self, n: usize) -> Self {
        self.extension_matches = Some(n);
        self
    }
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
    pub fn null_match_scaling(mut self, scaling: f64) -> Self {
        self.null_match_scaling = Some(scaling);
        self
    }
    pub fn match_balance(mut self, ratio: f64) -> Self {
        self.match_balance = Some(ratio);
        self
    }
    pub fn match_size_limit(mut self, limit: f64) -> Self {
        self.match_size_limit = Some(limit);
        self
    }
    pub fn match_node_nr_limit(mut self, limit: usize) -> Self {
        self.match_node_nr_limit = Some(limit);
        self
    }
    pub fn max_cells(mut self, cells: Option<usize>) -> Self {
        self.max_cells = cells;
        self
    }

    /// Unset parameters fall back to [`SearchConfig::default`].
    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let defaults = SearchConfig::default();
        let config = SearchConfig {
            n_best_solutions: self.n_best_solutions.unwrap_or(defaults.n_best_solutions),
            subtree_matching_buffer: self
                .subtree_matching_buffer
                .unwrap_or(defaults.subtree_matching_buffer),
            extension_matches: self.extension_matches.unwrap_or(defaults.extension_matches),
            alpha: self.alpha.unwrap_or(defaults.alpha),
            null_match_scaling: self
                .null_match_scaling
                .unwrap_or(defaults.null_match_scaling),
            match_balance: self.match_balance.unwrap_or(defaults.match_balance),
            match_size_limit: self.match_size_limit.unwrap_or(defaults.match_size_limit),
            match_node_nr_limit: self
                .match_node_nr_limit
                .unwrap_or(defaults.match_node_nr_limit),
            max_cells: self.max_cells,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SearchConfig::default().validate(), Ok(()));
    }

    #[test]
    fn builder_overrides_selected_values_and_keeps_defaults() {
        let config = SearchConfigBuilder::new()
            .n_best_solutions(5)
            .alpha(0.5)
            .max_cells(Some(10))
            .build()
            .unwrap();
        assert_eq!(config.n_best_solutions, 5);
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.max_cells, Some(10));
        assert_eq!(config.match_balance, SearchConfig::default().match_balance);
    }

    #[test]
    fn builder_rejects_null_match_scaling_below_half() {
        let err = SearchConfigBuilder::new()
            .null_match_scaling(0.3)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                name: "null_match_scaling",
                ..
            }
        ));
    }

    #[test]
    fn builder_rejects_zero_list_sizes_and_bad_ratios() {
        assert!(SearchConfigBuilder::new().n_best_solutions(0).build().is_err());
        assert!(SearchConfigBuilder::new().extension_matches(0).build().is_err());
        assert!(SearchConfigBuilder::new().match_balance(0.5).build().is_err());
        assert!(SearchConfigBuilder::new().alpha(f64::NAN).build().is_err());
        assert!(SearchConfigBuilder::new().subtree_matching_buffer(-0.1).build().is_err());
    }
}

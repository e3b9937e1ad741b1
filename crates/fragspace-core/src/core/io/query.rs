use super::format::{FormatError, RawNode, RawTree};
use crate::core::models::tree::PharmacophoreTree;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid query tree in '{path}': {source}")]
    Format { path: String, source: FormatError },
    #[error("Query tree in '{path}' contains link nodes; queries must be complete molecules")]
    LinkNodeInQuery { path: String },
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawQuery {
    name: Option<String>,
    #[serde(default)]
    edges: Vec<[usize; 2]>,
    #[serde(default)]
    nodes: Vec<RawNode>,
}

/// A query molecule as a pharmacophore tree.
#[derive(Debug, Clone)]
pub struct Query {
    pub name: String,
    pub tree: PharmacophoreTree,
}

impl Query {
    pub fn load(path: &Path) -> Result<Self, QueryLoadError> {
        let origin = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| QueryLoadError::Io {
            path: origin.clone(),
            source: e,
        })?;
        let default_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "query".to_string());
        Self::parse(&content, &origin, &default_name)
    }

    pub fn parse(content: &str, origin: &str, default_name: &str) -> Result<Self, QueryLoadError> {
        let raw: RawQuery = toml::from_str(content).map_err(|e| QueryLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        let tree = RawTree {
            edges: raw.edges,
            nodes: raw.nodes,
        }
        .into_tree()
        .map_err(|e| QueryLoadError::Format {
            path: origin.to_string(),
            source: e,
        })?;
        if tree.link_nodes().next().is_some() {
            return Err(QueryLoadError::LinkNodeInQuery {
                path: origin.to_string(),
            });
        }
        Ok(Self {
            name: raw.name.unwrap_or_else(|| default_name.to_string()),
            tree,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const QUERY: &str = r#"
name = "benzamide"
edges = [[0, 1]]

[[nodes]]
type = "feature"
size = 6.0
functionalities = { aromatic = 1.0 }

[[nodes]]
type = "feature"
size = 3.0
functionalities = { acceptor = 1.0, donor = 1.0 }
"#;

    #[test]
    fn load_reads_query_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benzamide.toml");
        fs::write(&path, QUERY).unwrap();
        let query = Query::load(&path).unwrap();
        assert_eq!(query.name, "benzamide");
        assert_eq!(query.tree.node_count(), 2);
        assert_eq!(query.tree.edge_count(), 1);
    }

    #[test]
    fn name_defaults_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my_query.toml");
        fs::write(&path, QUERY.replace("name = \"benzamide\"", "")).unwrap();
        assert_eq!(Query::load(&path).unwrap().name, "my_query");
    }

    #[test]
    fn load_fails_for_missing_file() {
        let result = Query::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(QueryLoadError::Io { .. })));
    }

    #[test]
    fn parse_rejects_unknown_keys_and_link_nodes() {
        let result = Query::parse("colour = 3", "inline", "q");
        assert!(matches!(result, Err(QueryLoadError::Toml { .. })));

        let with_link = r#"
edges = [[0, 1]]
[[nodes]]
type = "feature"
size = 1.0
[[nodes]]
type = "link"
linker-id = 1
"#;
        let result = Query::parse(with_link, "inline", "q");
        assert!(matches!(result, Err(QueryLoadError::LinkNodeInQuery { .. })));
    }

    #[test]
    fn parse_reports_invalid_tree() {
        let broken = r#"
edges = [[0, 3]]
[[nodes]]
type = "feature"
size = 1.0
[[nodes]]
type = "feature"
size = 1.0
"#;
        let result = Query::parse(broken, "inline", "q");
        assert!(matches!(result, Err(QueryLoadError::Format { .. })));
    }
}

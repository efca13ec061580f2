use std::path::PathBuf;

use restgen_compiler::CompileError;
use restgen_merge::MergeError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid schema pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no schema files found matching patterns: {}", patterns.join(", "))]
    NoSchemas { patterns: Vec<String> },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize schema: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{failed} of {total} schema(s) failed")]
    SchemasFailed { failed: usize, total: usize },
}

impl CliError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

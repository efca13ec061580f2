//! `restgen.yaml` loading.
//!
//! Every key is optional; missing keys take their defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! package: routes
//! output: ./routes
//! models:
//!   package: github.com/yourorg/yourapp/models
//! scalars:
//!   Decimal: decimal.Decimal
//! schemas:
//!   - ./schemas/*.sdl
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use restgen_emit::{EmitOptions, ScalarMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Generator settings. Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Go package of the generated routes files.
    pub package: String,
    /// Directory the routes files are written to.
    pub output: PathBuf,
    pub models: ModelsConfig,
    /// SDL scalar → Go type; merged over the built-in mappings.
    pub scalars: ScalarMap,
    /// Glob patterns selecting schema files.
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Models package for schemas without a `# @models` directive.
    pub package: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package: "routes".to_string(),
            output: PathBuf::from("./routes"),
            models: ModelsConfig::default(),
            scalars: ScalarMap::default(),
            schemas: vec!["./schemas/*.sdl".to_string()],
        }
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(raw)?;
        let mut scalars = ScalarMap::default();
        scalars.extend(config.scalars);
        config.scalars = scalars;
        Ok(config)
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            package: self.package.clone(),
            models: Some(self.models.package.clone()).filter(|package| !package.is_empty()),
            scalars: self.scalars.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_yaml("package: handlers\n").unwrap();
        assert_eq!(config.package, "handlers");
        assert_eq!(config.output, PathBuf::from("./routes"));
        assert_eq!(config.schemas, vec!["./schemas/*.sdl"]);
        assert_eq!(config.scalars.get("Int"), Some("int"));
    }

    #[test]
    fn test_user_scalars_merge_over_defaults() {
        let config = Config::from_yaml("scalars:\n  ID: uuid.UUID\n  Decimal: decimal.Decimal\n")
            .unwrap();
        assert_eq!(config.scalars.get("ID"), Some("uuid.UUID"));
        assert_eq!(config.scalars.get("Decimal"), Some("decimal.Decimal"));
        assert_eq!(config.scalars.get("Boolean"), Some("bool"));
    }

    #[test]
    fn test_models_package_feeds_emit_options() {
        let config =
            Config::from_yaml("models:\n  package: github.com/acme/api/models\n").unwrap();
        assert_eq!(
            config.emit_options().models.as_deref(),
            Some("github.com/acme/api/models")
        );
        assert_eq!(Config::default().emit_options().models, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = Config::from_yaml("helpers:\n  package: x\npackage: api\n").unwrap();
        assert_eq!(config.package, "api");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("restgen.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_yaml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restgen.yaml");
        fs::write(&path, "schemas: [unclosed\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("restgen.yaml"));
    }
}

//! Go code emission for restgen schemas.
//!
//! [`RoutesEmitter`] renders one chi routes file per schema: a handler type,
//! route registration, middleware hooks, and a not-implemented stub per call.
//! Everything above the marker line is regenerated on every run; everything
//! below it is reconciled with the previous output by `restgen-merge`.
//!
//! [`DependenciesEmitter`] renders the one-shot `dependencies.go` scaffold.

mod dependencies;
mod routes;
mod scalars;

use serde::{Deserialize, Serialize};

pub use dependencies::DependenciesEmitter;
pub use routes::{RoutesEmitter, handler_name};
pub use scalars::ScalarMap;

/// Settings shared by every emitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Go package of the generated files.
    pub package: String,
    /// Models package for schemas without a `# @models` directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<String>,
    #[serde(default)]
    pub scalars: ScalarMap,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            package: "routes".to_string(),
            models: None,
            scalars: ScalarMap::default(),
        }
    }
}

//! Schema assembly and include resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use restgen_core::{Include, Schema};
use tracing::{debug, info};

use crate::cache::{CacheSlot, SchemaCache};
use crate::error::{CompileError, Result};
use crate::syntax::{Directive, PatternSyntax, SchemaSyntax};

/// Compiles SDL files into [`Schema`] values.
///
/// A compiler owns its include cache: within one compiler every file is read
/// and parsed once, and schemas that include the same file share it.
///
/// # Examples
///
/// ```
/// use restgen_compiler::Compiler;
///
/// let mut compiler = Compiler::new();
/// let schema = compiler
///     .compile_str(
///         "# @base(\"/v1/ping\")\nCalls {\n  ping(): Pong! @get(\"/\")\n}\n",
///         None,
///     )
///     .unwrap();
/// assert_eq!(schema.base.as_deref(), Some("/v1/ping"));
/// assert_eq!(schema.calls[0].handler_name(), "Ping");
/// ```
#[derive(Debug)]
pub struct Compiler<S: SchemaSyntax = PatternSyntax> {
    syntax: S,
    cache: SchemaCache,
    /// Canonical paths currently being compiled, outermost first.
    stack: Vec<PathBuf>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_syntax(PatternSyntax)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SchemaSyntax> Compiler<S> {
    /// Creates a compiler that uses a custom front end.
    pub fn with_syntax(syntax: S) -> Self {
        Self {
            syntax,
            cache: SchemaCache::new(),
            stack: Vec::new(),
        }
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Compiles the file at `path` and everything it includes.
    ///
    /// Errors are tagged with `path`.
    pub fn compile_file(&mut self, path: impl AsRef<Path>) -> Result<Arc<Schema>> {
        let path = path.as_ref();
        let schema = canonicalize(path)
            .and_then(|canonical| self.load(canonical))
            .map_err(|source| CompileError::InFile {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?;
        info!(path = %path.display(), calls = schema.calls.len(), "Compiled schema");
        Ok(schema)
    }

    /// Compiles in-memory source.
    ///
    /// Relative includes resolve against `base_dir`, or the working directory
    /// when it is `None`. The result has no file name.
    pub fn compile_str(&mut self, source: &str, base_dir: Option<&Path>) -> Result<Schema> {
        self.assemble(source, base_dir.unwrap_or(Path::new(".")))
    }

    fn load(&mut self, canonical: PathBuf) -> Result<Arc<Schema>> {
        match self.cache.lookup(&canonical) {
            Some(CacheSlot::Ready(schema)) => {
                debug!(path = %canonical.display(), "Schema cache hit");
                return Ok(Arc::clone(schema));
            }
            Some(CacheSlot::Compiling) => {
                let start = self
                    .stack
                    .iter()
                    .position(|p| *p == canonical)
                    .unwrap_or(0);
                let mut chain = self.stack[start..].to_vec();
                chain.push(canonical);
                return Err(CompileError::IncludeCycle { chain });
            }
            None => {}
        }

        self.cache.mark_compiling(canonical.clone());
        self.stack.push(canonical.clone());
        let result = self.compile_canonical(&canonical);
        self.stack.pop();

        match result {
            Ok(schema) => {
                let schema = Arc::new(schema);
                self.cache.store(canonical, Arc::clone(&schema));
                Ok(schema)
            }
            Err(err) => {
                self.cache.forget(&canonical);
                Err(err)
            }
        }
    }

    fn compile_canonical(&mut self, path: &Path) -> Result<Schema> {
        debug!(path = %path.display(), "Compiling schema file");
        let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        let mut schema = self.assemble(&source, base_dir)?;
        schema.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(schema)
    }

    fn assemble(&mut self, source: &str, base_dir: &Path) -> Result<Schema> {
        let doc = self.syntax.parse_document(source)?;

        let mut includes = Vec::with_capacity(doc.includes.len());
        for directive in &doc.includes {
            let include = self
                .resolve_include(directive, base_dir)
                .map_err(|source| CompileError::Include {
                    path: directive.value.clone(),
                    source: Box::new(source),
                })?;
            includes.push(include);
        }

        Ok(Schema {
            file_name: None,
            base: doc.base,
            models: doc.models,
            includes,
            calls: doc.calls,
            types: doc.types,
            inputs: doc.inputs,
            enums: doc.enums,
        })
    }

    fn resolve_include(&mut self, directive: &Directive, base_dir: &Path) -> Result<Include> {
        let target = Path::new(&directive.value);
        let resolved = if target.is_absolute() {
            target.to_path_buf()
        } else {
            base_dir.join(target)
        };
        let schema = self.load(canonicalize(&resolved)?)?;
        let namespace = namespace_for(&directive.value);
        debug!(
            include = %directive.value,
            namespace = %namespace,
            line = directive.line,
            "Resolved include"
        );

        Ok(Include {
            path: directive.value.clone(),
            namespace,
            models: schema.models.clone(),
            schema,
        })
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Namespace of an included file: its stem with every character outside
/// `[A-Za-z0-9_]` replaced by `_` (`geo-models.sdl` → `geo_models`).
///
/// # Examples
///
/// ```
/// use restgen_compiler::namespace_for;
///
/// assert_eq!(namespace_for("shared/geo.sdl"), "geo");
/// assert_eq!(namespace_for("geo-models.sdl"), "geo_models");
/// ```
pub fn namespace_for(include_path: &str) -> String {
    let stem = Path::new(include_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Document;

    /// Front end that returns a fixed document, for testing assembly alone.
    struct FixedSyntax(Document);

    impl SchemaSyntax for FixedSyntax {
        fn parse_document(&self, _source: &str) -> Result<Document> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_custom_syntax_is_used() {
        let doc = Document {
            base: Some("/fixed".to_string()),
            ..Default::default()
        };
        let mut compiler = Compiler::with_syntax(FixedSyntax(doc));
        let schema = compiler.compile_str("ignored", None).unwrap();
        assert_eq!(schema.base.as_deref(), Some("/fixed"));
        assert!(schema.file_name.is_none());
    }

    #[test]
    fn test_missing_include_is_an_io_error() {
        let mut compiler = Compiler::new();
        let err = compiler
            .compile_str("# @include(\"does-not-exist.sdl\")\n", Some(Path::new("/nonexistent")))
            .unwrap_err();
        assert!(matches!(err, CompileError::Include { ref path, .. } if path == "does-not-exist.sdl"));
        assert!(matches!(err.root_cause(), CompileError::Io { .. }));
    }

    #[test]
    fn test_namespace_for_dotted_stem() {
        assert_eq!(namespace_for("/abs/geo.v2.sdl"), "geo_v2");
    }
}

//! Error types for SDL compilation.
//!
//! Every variant is fatal to the compilation of the file it occurs in.
//! Errors raised inside an included file are wrapped so the message shows
//! the include chain that led to them.

use std::path::PathBuf;

use restgen_core::ValidationError;
use thiserror::Error;

/// Errors that can occur while compiling an SDL file.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The file or an include target could not be read.
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `@base` or `@models` declared more than once in one file.
    #[error("line {line}: duplicate @{directive} directive (first declared on line {first_line})")]
    DuplicateDirective {
        directive: &'static str,
        line: usize,
        first_line: usize,
    },

    /// A block header with no matching closing brace.
    #[error("line {line}: unterminated {kind} block `{name}`")]
    UnterminatedBlock {
        kind: String,
        name: String,
        line: usize,
    },

    /// An argument without a `name: Type` shape.
    #[error("line {line}: invalid argument `{text}` in call `{call}`")]
    MalformedArg {
        call: String,
        text: String,
        line: usize,
    },

    /// A field or enum value line that does not parse.
    #[error("line {line}: invalid member `{text}` in {block}")]
    MalformedField {
        block: String,
        text: String,
        line: usize,
    },

    /// A call that violates its routing invariants.
    #[error("line {line}: {source}")]
    Validation {
        line: usize,
        #[source]
        source: ValidationError,
    },

    /// An include chain that leads back to a file still being compiled.
    #[error("include cycle detected: {}", format_chain(.chain))]
    IncludeCycle { chain: Vec<PathBuf> },

    /// Failure while compiling an included file.
    #[error("include `{path}`: {source}")]
    Include {
        path: String,
        #[source]
        source: Box<CompileError>,
    },

    /// Failure while compiling a file, tagged with its path.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// Returns the innermost error, skipping file and include context.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use restgen_compiler::CompileError;
    ///
    /// let err = CompileError::InFile {
    ///     path: PathBuf::from("contacts.sdl"),
    ///     source: Box::new(CompileError::IncludeCycle { chain: Vec::new() }),
    /// };
    /// assert!(matches!(err.root_cause(), CompileError::IncludeCycle { .. }));
    /// ```
    pub fn root_cause(&self) -> &CompileError {
        match self {
            Self::Include { source, .. } | Self::InFile { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Convenience alias for results with [`CompileError`].
pub type Result<T> = std::result::Result<T, CompileError>;

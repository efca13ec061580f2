//! SDL compiler for restgen.
//!
//! Turns `.sdl` schema files into the [`restgen_core::Schema`] IR:
//!
//! 1. [`syntax::scan_directives`] reads `# @base`, `# @models`, and
//!    `# @include` comment directives.
//! 2. [`syntax::extract_blocks`] finds `type`, `input`, `enum`, and `Calls`
//!    blocks by brace matching.
//! 3. Block bodies are parsed into calls, fields, and enum values; each call
//!    is validated as soon as it is parsed.
//! 4. [`Compiler`] resolves includes recursively through its [`SchemaCache`]
//!    and assembles one schema per file.
//!
//! # Example
//!
//! ```
//! let schema = restgen_compiler::compile_str(
//!     r#"
//! # @base("/v1/contacts")
//! type Calls {
//!     listContacts(filter: ContactFilter): [Contact!]! @get("/")
//!     updateContact(id: ID!, input: UpdateContactInput!): Contact! @put("/{id}")
//! }
//! "#,
//! )
//! .unwrap();
//!
//! let list = schema.find_call("listContacts").unwrap();
//! assert!(list.return_is_list() && list.return_required());
//!
//! let bad = restgen_compiler::compile_str(
//!     "Calls {\n  foo(a: String, b: String): Foo @post(\"/\")\n}",
//! );
//! assert!(bad.is_err());
//! ```

mod cache;
mod compiler;
mod error;
pub mod syntax;

use std::path::Path;
use std::sync::Arc;

use restgen_core::Schema;

pub use cache::{CacheSlot, SchemaCache};
pub use compiler::{Compiler, namespace_for};
pub use error::{CompileError, Result};
pub use syntax::{Document, PatternSyntax, SchemaSyntax};

/// Compiles in-memory SDL with a fresh [`Compiler`].
///
/// Relative includes resolve against the working directory.
pub fn compile_str(source: &str) -> Result<Schema> {
    Compiler::new().compile_str(source, None)
}

/// Compiles one SDL file with a fresh [`Compiler`].
pub fn compile_file(path: impl AsRef<Path>) -> Result<Arc<Schema>> {
    Compiler::new().compile_file(path)
}

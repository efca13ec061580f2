//! SDL front end.
//!
//! The SDL is loosely structured: metadata lives in `#` comment directives,
//! declarations live in brace-delimited blocks, and block bodies are parsed
//! line by line. [`PatternSyntax`] implements this with regular expressions
//! and depth-counted brace matching.
//!
//! The front end sits behind [`SchemaSyntax`] so a grammar-based parser can
//! replace it without touching the [`Compiler`](crate::Compiler) or the IR
//! consumers. A front end produces a [`Document`]: everything in one file,
//! with include directives still unresolved.

mod blocks;
mod calls;
mod directives;
mod fields;

use restgen_core::{Call, EnumDef, InputDef, TypeDef};
use tracing::debug;

use crate::error::Result;

pub use blocks::{Block, BlockKind, extract_blocks};
pub use calls::parse_calls;
pub use directives::{Directive, Directives, scan_directives};
pub use fields::{parse_enum_values, parse_fields, split_top_level};

/// Everything declared in one SDL file, before include resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub base: Option<String>,
    pub models: Option<String>,
    pub includes: Vec<Directive>,
    pub calls: Vec<Call>,
    pub types: Vec<TypeDef>,
    pub inputs: Vec<InputDef>,
    pub enums: Vec<EnumDef>,
}

/// A front end that turns SDL source text into a [`Document`].
pub trait SchemaSyntax {
    /// Parses one file's text. Include directives are returned as written.
    fn parse_document(&self, source: &str) -> Result<Document>;
}

/// Regex and brace-counting front end for the SDL.
///
/// # Examples
///
/// ```
/// use restgen_compiler::{PatternSyntax, SchemaSyntax};
///
/// let source = r#"
/// ## @base("/v1/contacts")
/// type Calls {
///     getContact(id: ID!): Contact @get("/{id}")
/// }
/// type Contact {
///     id: ID!
/// }
/// "#;
///
/// let doc = PatternSyntax.parse_document(source).unwrap();
/// assert_eq!(doc.base.as_deref(), Some("/v1/contacts"));
/// assert_eq!(doc.calls.len(), 1);
/// assert_eq!(doc.types.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSyntax;

impl SchemaSyntax for PatternSyntax {
    fn parse_document(&self, source: &str) -> Result<Document> {
        let directives = scan_directives(source)?;
        let mut doc = Document {
            base: directives.base.map(|d| d.value),
            models: directives.models.map(|d| d.value),
            includes: directives.includes,
            ..Default::default()
        };

        for block in extract_blocks(source)? {
            match block.kind {
                BlockKind::Calls => doc.calls.extend(parse_calls(&block)?),
                BlockKind::Type => doc.types.push(TypeDef {
                    name: block.name.to_string(),
                    fields: parse_fields(&block)?,
                }),
                BlockKind::Input => doc.inputs.push(InputDef {
                    name: block.name.to_string(),
                    fields: parse_fields(&block)?,
                }),
                BlockKind::Enum => doc.enums.push(EnumDef {
                    name: block.name.to_string(),
                    values: parse_enum_values(&block)?,
                }),
            }
        }

        debug!(
            calls = doc.calls.len(),
            types = doc.types.len(),
            inputs = doc.inputs.len(),
            enums = doc.enums.len(),
            includes = doc.includes.len(),
            "Parsed SDL document"
        );

        Ok(doc)
    }
}

/// Replaces every `#` comment (to end of line) with spaces.
///
/// Byte offsets are preserved so positions found in the masked text index
/// the original text directly.
pub(crate) fn mask_comments(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut in_comment = false;
    for ch in text.chars() {
        if ch == '\n' {
            in_comment = false;
            masked.push('\n');
        } else if in_comment || ch == '#' {
            in_comment = true;
            masked.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            masked.push(ch);
        }
    }
    masked
}

/// 1-based line number of a byte offset.
pub(crate) fn line_at(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_comments_preserves_offsets() {
        let text = "a # é comment\nb {";
        let masked = mask_comments(text);
        assert_eq!(masked.len(), text.len());
        assert_eq!(masked.find('b'), text.find('b'));
        assert!(!masked.contains('#'));
    }

    #[test]
    fn test_line_at() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_at(text, 0), 1);
        assert_eq!(line_at(text, 4), 2);
        assert_eq!(line_at(text, text.len()), 3);
    }

    #[test]
    fn test_document_collects_all_block_kinds() {
        let source = r#"
# @models("github.com/acme/api/models")
Calls {
    listTags: [Tag!]! @get("/")
    listContacts(filter: ContactFilter): [Contact!]! @get("/")
}
input ContactFilter {
    search: String
}
enum Status {
    ACTIVE
    ARCHIVED
}
type Contact {
    status: Status!
}
"#;
        let doc = PatternSyntax.parse_document(source).unwrap();
        assert_eq!(doc.models.as_deref(), Some("github.com/acme/api/models"));
        assert_eq!(doc.calls.len(), 1, "listTags has no argument list");
        assert_eq!(doc.inputs[0].name, "ContactFilter");
        assert_eq!(doc.enums[0].values, vec!["ACTIVE", "ARCHIVED"]);
        assert_eq!(doc.types[0].fields[0].ty.name, "Status");
    }
}

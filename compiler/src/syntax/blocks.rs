//! Brace-delimited block extraction.
//!
//! Block headers are found with a regex; the matching close brace is found by
//! depth counting, since nested braces defeat a single pattern. Both passes run
//! over a comment-masked copy of the source so `#` comments never open or
//! close a block.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::{line_at, mask_comments};
use crate::error::{CompileError, Result};

static BLOCK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(type|input|enum)\s+(\w+)|(Calls))\s*\{").expect("static regex must compile")
});

const CALLS_BLOCK: &str = "Calls";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Type,
    Input,
    Enum,
    Calls,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Input => "input",
            Self::Enum => "enum",
            Self::Calls => "Calls",
        })
    }
}

/// A block with its interior text borrowed from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind,
    pub name: &'a str,
    /// Text between the braces, verbatim (comments included).
    pub body: &'a str,
    /// Line of the block header.
    pub line: usize,
    /// Line on which `body` starts (the line of the opening brace).
    pub body_line: usize,
}

impl<'a> Block<'a> {
    /// Body lines paired with their 1-based line numbers in the source.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let first = self.body_line;
        self.body
            .lines()
            .enumerate()
            .map(move |(index, line)| (first + index, line))
    }

    /// Human-readable identity used in error messages (`type Contact`).
    pub fn label(&self) -> String {
        match self.kind {
            BlockKind::Calls => CALLS_BLOCK.to_string(),
            kind => format!("{kind} {}", self.name),
        }
    }
}

/// Extracts every top-level block in source order.
///
/// `type Calls { ... }` and a bare `Calls { ... }` are both the calls block.
/// Headers that occur inside an earlier block's body are skipped.
///
/// # Examples
///
/// ```
/// use restgen_compiler::syntax::{BlockKind, extract_blocks};
///
/// let blocks = extract_blocks("input Point {\n  x: Int!\n}\nCalls { }").unwrap();
/// assert_eq!(blocks[0].kind, BlockKind::Input);
/// assert_eq!(blocks[0].name, "Point");
/// assert_eq!(blocks[0].body, "\n  x: Int!\n");
/// assert_eq!(blocks[1].kind, BlockKind::Calls);
/// ```
pub fn extract_blocks(source: &str) -> Result<Vec<Block<'_>>> {
    let masked = mask_comments(source);
    let mut blocks = Vec::new();
    let mut resume_at = 0;

    for caps in BLOCK_HEADER_RE.captures_iter(&masked) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() < resume_at {
            continue;
        }

        let (kind, name) = match (caps.get(1), caps.get(2)) {
            (Some(keyword), Some(name)) => {
                let name = &source[name.range()];
                let kind = match keyword.as_str() {
                    _ if name == CALLS_BLOCK => BlockKind::Calls,
                    "type" => BlockKind::Type,
                    "input" => BlockKind::Input,
                    _ => BlockKind::Enum,
                };
                (kind, name)
            }
            _ => (BlockKind::Calls, CALLS_BLOCK),
        };

        // The header match ends just past the opening brace.
        let open = whole.end() - 1;
        let line = line_at(source, whole.start());
        let close = matching_brace(&masked, open).ok_or_else(|| CompileError::UnterminatedBlock {
            kind: kind.to_string(),
            name: name.to_string(),
            line,
        })?;

        blocks.push(Block {
            kind,
            name,
            body: &source[open + 1..close],
            line,
            body_line: line_at(source, open),
        });
        resume_at = close + 1;
    }

    Ok(blocks)
}

/// Byte offset of the `}` closing the `{` at `open`.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, byte) in text.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_in_any_order_with_comments() {
        let source = "\
# A contact { not a block
type Contact {
    id: ID! # primary key }
}

# calls follow
type Calls {
    getContact(id: ID!): Contact @get(\"/{id}\")
}
";
        let blocks = extract_blocks(source).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Type);
        assert_eq!(blocks[0].line, 2);
        assert!(blocks[0].body.contains("# primary key }"));
        assert_eq!(blocks[1].kind, BlockKind::Calls);
        assert_eq!(blocks[1].line, 7);
    }

    #[test]
    fn test_nested_braces_stay_in_body() {
        let source = "type Outer {\n  inner: Inner {\n    x: Int\n  }\n}\ntype Next { }";
        let blocks = extract_blocks(source).unwrap();
        let names: Vec<_> = blocks.iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Outer", "Next"]);
        assert!(blocks[0].body.contains("x: Int"));
    }

    #[test]
    fn test_unterminated_block() {
        let err = extract_blocks("\n\nenum Status {\n  ACTIVE\n").unwrap_err();
        match err {
            CompileError::UnterminatedBlock { kind, name, line } => {
                assert_eq!(kind, "enum");
                assert_eq!(name, "Status");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_numbered_lines_follow_source() {
        let source = "\ntype A {\n  a: Int\n  b: Int\n}";
        let blocks = extract_blocks(source).unwrap();
        let lines: Vec<_> = blocks[0]
            .numbered_lines()
            .filter(|(_, l)| !l.trim().is_empty())
            .collect();
        assert_eq!(lines, vec![(3, "  a: Int"), (4, "  b: Int")]);
        assert_eq!(blocks[0].label(), "type A");
    }
}

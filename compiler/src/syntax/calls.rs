//! Calls block parsing.

use std::sync::LazyLock;

use regex::Regex;
use restgen_core::{Arg, Call, HttpMethod, TypeRef};
use tracing::{debug, warn};

use super::fields::{split_member, split_top_level};
use super::{Block, line_at, mask_comments};
use crate::error::{CompileError, Result};

/// `name(args): ReturnType @verb("path")`
static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(\w+)\s*\(([^)]*)\)\s*:\s*(\[?[\w.]+!?\]?!?)\s*@(?i:(get|post|put|patch|delete))\s*\(\s*"([^"]+)"\s*\)"#,
    )
    .expect("static regex must compile")
});

/// Parses and validates every call declared in a calls block.
///
/// Text that does not form a call is logged and skipped.
///
/// # Examples
///
/// ```
/// use restgen_compiler::syntax::{extract_blocks, parse_calls};
///
/// let source = r#"Calls {
///     updateContact(id: ID!, input: UpdateContactInput!): Contact! @put("/{id}")
/// }"#;
/// let blocks = extract_blocks(source).unwrap();
/// let calls = parse_calls(&blocks[0]).unwrap();
/// assert_eq!(calls[0].path_params(), vec!["id"]);
/// assert_eq!(calls[0].body_arg().unwrap().name, "input");
/// ```
pub fn parse_calls(block: &Block<'_>) -> Result<Vec<Call>> {
    let masked = mask_comments(block.body);
    let mut leftover = masked.clone().into_bytes();
    let mut calls = Vec::new();

    for caps in CALL_RE.captures_iter(&masked) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let line = block.body_line + line_at(&masked, whole.start()) - 1;
        leftover[whole.range()]
            .iter_mut()
            .filter(|byte| **byte != b'\n')
            .for_each(|byte| *byte = b' ');

        let name = &caps[1];
        let method = HttpMethod::from_verb(&caps[4]).ok_or_else(|| CompileError::MalformedArg {
            call: name.to_string(),
            text: caps[4].to_string(),
            line,
        })?;

        let call = Call {
            name: name.to_string(),
            method,
            path: caps[5].to_string(),
            args: parse_args(name, &caps[2], line)?,
            return_type: TypeRef::parse(&caps[3]),
        };
        call.validate()
            .map_err(|source| CompileError::Validation { line, source })?;

        debug!(call = %call.name, method = %call.method, path = %call.path, "Parsed call");
        calls.push(call);
    }

    report_unmatched(block, &leftover);
    Ok(calls)
}

fn parse_args(call: &str, text: &str, line: usize) -> Result<Vec<Arg>> {
    split_top_level(text, ',')
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            split_member(piece)
                .map(|(name, ty)| Arg::new(name, ty))
                .ok_or_else(|| CompileError::MalformedArg {
                    call: call.to_string(),
                    text: piece.to_string(),
                    line,
                })
        })
        .collect()
}

fn report_unmatched(block: &Block<'_>, leftover: &[u8]) {
    // Matched ranges are blanked whole, so the bytes stay valid UTF-8.
    let Ok(leftover) = std::str::from_utf8(leftover) else {
        return;
    };
    for (index, text) in leftover.lines().enumerate() {
        let text = text.trim();
        if !text.is_empty() {
            warn!(
                line = block.body_line + index,
                text, "Ignoring unrecognized text in Calls block"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::extract_blocks;
    use restgen_core::ValidationError;

    fn calls_of(source: &str) -> Result<Vec<Call>> {
        let blocks = extract_blocks(source)?;
        parse_calls(&blocks[0])
    }

    #[test]
    fn test_list_return_shape() {
        let calls = calls_of(
            "Calls {\n  listContacts(filter: ContactFilter): [Contact!]! @get(\"/\")\n}",
        )
        .unwrap();
        let call = &calls[0];
        assert!(call.return_is_list());
        assert!(call.return_required());
        assert_eq!(call.return_type.name, "Contact");
        assert_eq!(call.query_args()[0].name, "filter");
    }

    #[test]
    fn test_verb_is_case_insensitive() {
        let calls =
            calls_of("Calls {\n  removeContact(id: ID!): Boolean! @DELETE(\"/{id}\")\n}").unwrap();
        assert_eq!(calls[0].method, HttpMethod::Delete);
    }

    #[test]
    fn test_multiple_body_args_fail_with_line() {
        let err = calls_of("Calls {\n\n  foo(a: String, b: String): Foo @post(\"/\")\n}").unwrap_err();
        match err {
            CompileError::Validation { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(source, ValidationError::MultipleBodyArgs { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unmatched_path_param_fails() {
        let err = calls_of("Calls {\n  getItem(id: ID!): Item @get(\"/{itemId}\")\n}").unwrap_err();
        assert!(err.to_string().contains("path parameter {itemId}"));
    }

    #[test]
    fn test_arg_without_colon_is_malformed() {
        let err = calls_of("Calls {\n  getItem(id): Item @get(\"/\")\n}").unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedArg { ref call, ref text, line: 2 } if call == "getItem" && text == "id"
        ));
    }

    #[test]
    fn test_commented_out_call_is_ignored() {
        let calls = calls_of(
            "Calls {\n  # oldCall(): Foo @get(\"/old\")\n  ping(): Pong @get(\"/ping\")\n}",
        )
        .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "ping");
        assert!(calls[0].args.is_empty());
    }

    #[test]
    fn test_multiline_arguments_and_trailing_comma() {
        let calls = calls_of(
            "Calls {\n  search(\n    q: String,\n    tags: [String!],\n  ): [Result!]! @get(\"/search\")\n}",
        )
        .unwrap();
        let names: Vec<_> = calls[0].args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["q", "tags"]);
        assert!(calls[0].args[1].ty.is_list);
    }
}

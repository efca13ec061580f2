//! Field, argument, and enum value parsing.

use restgen_core::{Field, TypeRef};

use super::Block;
use crate::error::{CompileError, Result};

/// Splits `text` on `sep` where the bracket depth is zero.
///
/// # Examples
///
/// ```
/// use restgen_compiler::syntax::split_top_level;
///
/// let pieces = split_top_level("id: ID!, tags: [String!], limit: Int", ',');
/// assert_eq!(pieces, vec!["id: ID!", " tags: [String!]", " limit: Int"]);
/// ```
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (offset, ch) in text.char_indices() {
        match ch {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            _ if ch == sep && depth == 0 => {
                pieces.push(&text[start..offset]);
                start = offset + ch.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Splits `name: Type` on the first colon.
///
/// Returns `None` when there is no colon or either side is empty.
pub(crate) fn split_member(text: &str) -> Option<(&str, TypeRef)> {
    let (name, ty) = text.split_once(':')?;
    let (name, ty) = (name.trim(), ty.trim());
    if name.is_empty() || ty.is_empty() {
        return None;
    }
    Some((name, TypeRef::parse(ty)))
}

/// Strips a trailing `#` comment and surrounding whitespace.
pub(crate) fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code).trim()
}

/// Parses the fields of a `type` or `input` block, one per line.
pub fn parse_fields(block: &Block<'_>) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    for (line_no, raw) in block.numbered_lines() {
        let line = strip_comment(raw).trim_end_matches(',').trim_end();
        if line.is_empty() {
            continue;
        }
        let (name, ty) = split_member(line).ok_or_else(|| CompileError::MalformedField {
            block: block.label(),
            text: line.to_string(),
            line: line_no,
        })?;
        fields.push(Field::new(name, ty));
    }
    Ok(fields)
}

/// Parses the values of an `enum` block.
///
/// Values are identifiers separated by whitespace or commas.
pub fn parse_enum_values(block: &Block<'_>) -> Result<Vec<String>> {
    let mut values = Vec::new();
    for (line_no, raw) in block.numbered_lines() {
        for value in strip_comment(raw)
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|v| !v.is_empty())
        {
            if !value.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(CompileError::MalformedField {
                    block: block.label(),
                    text: value.to_string(),
                    line: line_no,
                });
            }
            values.push(value.to_string());
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::extract_blocks;

    #[test]
    fn test_fields_with_comments_and_commas() {
        let source = "\
type Contact {
    # identity
    id: ID!, # primary key
    tags: [String!]!
    location: geo.Location
}";
        let blocks = extract_blocks(source).unwrap();
        let fields = parse_fields(&blocks[0]).unwrap();
        let rendered: Vec<_> = fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.ty))
            .collect();
        assert_eq!(
            rendered,
            vec!["id: ID!", "tags: [String!]!", "location: geo.Location"]
        );
    }

    #[test]
    fn test_field_without_colon_is_an_error() {
        let source = "input CreateContactInput {\n    name: String!\n    email String\n}";
        let blocks = extract_blocks(source).unwrap();
        let err = parse_fields(&blocks[0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 3: invalid member `email String` in input CreateContactInput"
        );
    }

    #[test]
    fn test_enum_values_whitespace_and_commas() {
        let source = "enum Status {\n  ACTIVE, ARCHIVED # soft delete\n  PENDING\n}";
        let blocks = extract_blocks(source).unwrap();
        assert_eq!(
            parse_enum_values(&blocks[0]).unwrap(),
            vec!["ACTIVE", "ARCHIVED", "PENDING"]
        );
    }

    #[test]
    fn test_enum_value_must_be_identifier() {
        let source = "enum Status {\n  ACTIVE: Int\n}";
        let blocks = extract_blocks(source).unwrap();
        assert!(matches!(
            parse_enum_values(&blocks[0]),
            Err(CompileError::MalformedField { line: 2, .. })
        ));
    }

    #[test]
    fn test_split_top_level_keeps_nested_commas() {
        assert_eq!(split_top_level("a(b, c), d", ','), vec!["a(b, c)", " d"]);
        assert_eq!(split_top_level("", ','), vec![""]);
    }
}

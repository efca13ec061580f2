//! Region extraction for generated Go handler files.
//!
//! A generated file is split at [`MARKER`] into scaffolding (above) and
//! handler implementations (below). The below region ends with the removed
//! handlers archive, introduced by [`REMOVED_MARKER`].
//!
//! Positions are found on a masked copy of the text in which Go comments and
//! string/rune literals are blanked out, so braces and signatures inside them
//! are never matched. Masking preserves byte offsets; extracted text is always
//! taken from the unmasked source.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use restgen_core::contract::{
    ARCHIVE_BODY_CLOSE, ARCHIVE_BODY_OPEN, ARCHIVE_PRESERVED_LINE, ARCHIVE_REMOVED_SUFFIX, MARKER,
    REMOVED_MARKER, unescape_archive_body,
};

static METHOD_SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"func\s*\(\s*\w+\s+\*\w+Handler\s*\)\s*(\w+)\s*\(").expect("static regex must compile")
});

static RECORD_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"type\s+(\w+Handler)\s+struct\s*\{").expect("static regex must compile")
});

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:func\b\s*(?:\([^)]*\)\s*)?(\w+)|type\s+(\w+)|(var|const)\b)")
        .expect("static regex must compile")
});

static ARCHIVE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^// (\w+) {}\n{}\n{}\n",
        regex::escape(ARCHIVE_REMOVED_SUFFIX),
        regex::escape(ARCHIVE_PRESERVED_LINE),
        regex::escape(ARCHIVE_BODY_OPEN),
    ))
    .expect("static regex must compile")
});

/// A handler method in the below region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBlock {
    pub name: String,
    /// Byte range of `text` in the scanned region.
    pub span: Range<usize>,
    /// Method source from its leading doc comment (if any) to the closing brace.
    pub text: String,
}

/// A method body parked in the removed handlers archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedMethod {
    pub name: String,
    pub body: String,
}

/// A named declaration with a brace-delimited body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlock {
    pub name: String,
    /// Byte range of the whole declaration.
    pub span: Range<usize>,
    /// Byte range strictly between the braces.
    pub body: Range<usize>,
}

impl NamedBlock {
    pub fn body_text<'a>(&self, region: &'a str) -> &'a str {
        &region[self.body.clone()]
    }
}

/// Splits `text` at the marker line.
///
/// Returns the text before the marker and, if the marker is present, the text
/// after it. Neither part contains the marker.
///
/// # Examples
///
/// ```
/// use restgen_core::contract::MARKER;
/// use restgen_merge::split_at_marker;
///
/// let text = format!("above\n{MARKER}\nbelow");
/// assert_eq!(split_at_marker(&text), ("above\n", Some("\nbelow")));
/// assert_eq!(split_at_marker("no marker"), ("no marker", None));
/// ```
pub fn split_at_marker(text: &str) -> (&str, Option<&str>) {
    match text.find(MARKER) {
        Some(at) => (&text[..at], Some(&text[at + MARKER.len()..])),
        None => (text, None),
    }
}

/// Splits a below region into live implementations and the archive.
///
/// The archive part starts with [`REMOVED_MARKER`].
pub fn split_archive(below: &str) -> (&str, Option<&str>) {
    match below.find(REMOVED_MARKER) {
        Some(at) => (&below[..at], Some(&below[at..])),
        None => (below, None),
    }
}

/// Extracts handler methods in source order.
///
/// Only the live part of `region` is scanned; archived bodies are never
/// returned as methods. Spans are relative to `region`.
///
/// # Examples
///
/// ```
/// use restgen_merge::extract_methods;
///
/// let below = "\nfunc (h *ContactsHandler) GetContact(w http.ResponseWriter, r *http.Request) {\n\tif true { return }\n}\n";
/// let methods = extract_methods(below);
/// assert_eq!(methods.len(), 1);
/// assert_eq!(methods[0].name, "GetContact");
/// assert!(methods[0].text.ends_with("return }\n}"));
/// ```
pub fn extract_methods(region: &str) -> Vec<MethodBlock> {
    let (live, _) = split_archive(region);
    let masked = mask_go(live);
    let mut methods = Vec::new();
    let mut resume_at = 0;

    for caps in METHOD_SIGNATURE_RE.captures_iter(&masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < resume_at {
            continue;
        }
        // The signature match ends just past the parameter list's `(`.
        let Some((_, close)) = body_braces(&masked, whole.end() - 1) else {
            continue;
        };
        let start = doc_comment_start(live, whole.start());
        let end = close + 1;
        methods.push(MethodBlock {
            name: name.as_str().to_string(),
            span: start..end,
            text: live[start..end].to_string(),
        });
        resume_at = end;
    }

    methods
}

/// Parses the archive entries that follow [`REMOVED_MARKER`] in `below`.
///
/// Bodies are unescaped, so they read exactly as they were archived.
///
/// # Examples
///
/// ```
/// use restgen_core::contract::{REMOVED_MARKER, archive_entry};
/// use restgen_merge::extract_archive;
///
/// let below = format!("{REMOVED_MARKER}{}", archive_entry("Old", "func (h *XHandler) Old() {}"));
/// let archived = extract_archive(&below);
/// assert_eq!(archived[0].name, "Old");
/// assert_eq!(archived[0].body, "func (h *XHandler) Old() {}");
/// ```
pub fn extract_archive(below: &str) -> Vec<ArchivedMethod> {
    let (_, Some(archive)) = split_archive(below) else {
        return Vec::new();
    };
    let terminator = format!("\n{ARCHIVE_BODY_CLOSE}");
    let mut entries = Vec::new();
    let mut from = 0;

    while let Some(caps) = ARCHIVE_HEADER_RE.captures_at(archive, from) {
        let (Some(header), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let body_start = header.end();
        let Some(len) = archive[body_start..].find(&terminator) else {
            break;
        };
        let body_end = body_start + len;
        entries.push(ArchivedMethod {
            name: name.as_str().to_string(),
            body: unescape_archive_body(&archive[body_start..body_end]),
        });
        from = body_end + terminator.len();
    }

    entries
}

/// Names top-level declarations in the live part of `region` that are not
/// among `methods`.
///
/// Functions and types are reported by name; `var` and `const` blocks by
/// keyword.
pub fn stray_declarations(region: &str, methods: &[MethodBlock]) -> Vec<String> {
    let (live, _) = split_archive(region);
    let masked = mask_go(live);
    DECLARATION_RE
        .captures_iter(&masked)
        .filter_map(|caps| {
            let at = caps.get(0)?.start();
            if methods.iter().any(|m| m.span.contains(&at)) {
                return None;
            }
            let name = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            Some(name.as_str().to_string())
        })
        .collect()
}

/// Finds the handler record type (`type XHandler struct { ... }`).
pub fn find_record_type(region: &str) -> Option<NamedBlock> {
    let masked = mask_go(region);
    let caps = RECORD_TYPE_RE.captures(&masked)?;
    let (whole, name) = (caps.get(0)?, caps.get(1)?);
    let open = whole.end() - 1;
    let close = matching_brace(&masked, open)?;
    Some(NamedBlock {
        name: name.as_str().to_string(),
        span: whole.start()..close + 1,
        body: open + 1..close,
    })
}

/// Finds a function or method named `name` at any receiver.
pub fn find_override(region: &str, name: &str) -> Option<NamedBlock> {
    let pattern = format!(r"func\s+(?:\([^)]*\)\s*)?{}\s*\(", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let masked = mask_go(region);
    let whole = re.find(&masked)?;
    let (open, close) = body_braces(&masked, whole.end() - 1)?;
    Some(NamedBlock {
        name: name.to_string(),
        span: whole.start()..close + 1,
        body: open + 1..close,
    })
}

/// Given the offset of a parameter list's `(`, finds the function body braces.
///
/// The body opens at the first `{` outside any parentheses.
fn body_braces(masked: &str, params_open: usize) -> Option<(usize, usize)> {
    let mut parens = 0i32;
    let open = masked
        .bytes()
        .enumerate()
        .skip(params_open)
        .find_map(|(offset, byte)| {
            match byte {
                b'(' => parens += 1,
                b')' => parens -= 1,
                b'{' if parens == 0 => return Some(offset),
                _ => {}
            }
            None
        })?;
    Some((open, matching_brace(masked, open)?))
}

fn matching_brace(masked: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, byte) in masked.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Start of the `//` comment lines directly above `func_start`.
fn doc_comment_start(text: &str, func_start: usize) -> usize {
    let line_start = text[..func_start].rfind('\n').map_or(0, |i| i + 1);
    // Only a `func` at the start of its line can carry a doc comment.
    if !text[line_start..func_start].trim().is_empty() {
        return func_start;
    }

    let mut start = func_start;
    let mut rest = &text[..line_start];
    while let Some(stripped) = rest.strip_suffix('\n') {
        let prev_start = stripped.rfind('\n').map_or(0, |i| i + 1);
        let line = stripped[prev_start..].trim();
        // Section banners belong to the scaffolding.
        if !line.starts_with("//") || line.starts_with("// ===") {
            break;
        }
        start = prev_start;
        rest = &text[..prev_start];
    }
    start
}

/// Blanks Go comments and string/rune literals, preserving offsets and newlines.
pub(crate) fn mask_go(text: &str) -> String {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str,
        RawStr,
        Rune,
    }

    fn blank(out: &mut String, ch: char) {
        if ch == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Code => {
                state = match ch {
                    '/' if chars.peek() == Some(&'/') => State::LineComment,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        out.push(' ');
                        State::BlockComment
                    }
                    '"' => State::Str,
                    '`' => State::RawStr,
                    '\'' => State::Rune,
                    _ => {
                        out.push(ch);
                        continue;
                    }
                };
                out.push(' ');
            }
            State::LineComment => {
                blank(&mut out, ch);
                if ch == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    blank(&mut out, ch);
                }
            }
            State::Str | State::Rune => {
                let quote = if state == State::Str { '"' } else { '\'' };
                blank(&mut out, ch);
                if ch == '\\' {
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                } else if ch == quote || ch == '\n' {
                    state = State::Code;
                }
            }
            State::RawStr => {
                blank(&mut out, ch);
                if ch == '`' {
                    state = State::Code;
                }
            }
        }
    }

    out
}
